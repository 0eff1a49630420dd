pub mod product_page;
