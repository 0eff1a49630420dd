#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Ping,
    AnalyzeProduct,
    GetTime,
    Unknown,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Ping => "ping",
            Method::AnalyzeProduct => "analyze_product",
            Method::GetTime => "get_time",
            Method::Unknown => "",
        }
    }
}

impl From<&str> for Method {
    fn from(s: &str) -> Self {
        match s {
            "ping" => Method::Ping,
            "analyze_product" => Method::AnalyzeProduct,
            "get_time" => Method::GetTime,
            _ => Method::Unknown,
        }
    }
}
