pub mod consts;
pub mod detect;
pub mod error;
pub mod frame;
pub mod io;
pub mod normalize;
pub mod pipeline;
pub mod sink;
pub mod source;
