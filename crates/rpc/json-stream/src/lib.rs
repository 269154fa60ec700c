//! Streaming JSON emitter (C12), used by `trace_filter` and the
//! `debug_traceBlock*` handlers to write large responses incrementally
//! instead of building the whole body in memory first.

mod stream;

pub use stream::JsonStream;
