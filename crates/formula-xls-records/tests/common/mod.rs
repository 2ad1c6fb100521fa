pub mod stream_builder;
