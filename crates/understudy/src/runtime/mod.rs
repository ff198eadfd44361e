pub mod call_log;
pub mod dispatcher;
pub mod frame;
pub mod synthesizer;
pub mod value;
