pub mod app_config;
pub mod http_gateway;
pub mod session_file;

pub use app_config::Config;
pub use http_gateway::HttpGateway;
pub use session_file::FileSessionStore;
