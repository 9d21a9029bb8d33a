/// Simplified error system - no over-engineering!
#[derive(Debug, Clone, PartialEq)]
pub enum ChartError {
    /// Transport failure reaching the backend.
    Network(String),
    /// Malformed payload from the backend.
    Parse(String),
    /// Backtest rejected the request; carries the backend `detail` verbatim.
    Backtest(String),
    /// The rendering surface could not satisfy a request.
    Surface(String),
}

impl std::fmt::Display for ChartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartError::Network(msg) => write!(f, "Network Error: {}", msg),
            ChartError::Parse(msg) => write!(f, "Parse Error: {}", msg),
            ChartError::Backtest(msg) => write!(f, "Backtest Error: {}", msg),
            ChartError::Surface(msg) => write!(f, "Surface Error: {}", msg),
        }
    }
}

impl std::error::Error for ChartError {}

pub type ChartResult<T> = Result<T, ChartError>;
