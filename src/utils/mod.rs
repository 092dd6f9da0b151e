pub mod line_buffer;
pub mod logging;
pub mod url;
