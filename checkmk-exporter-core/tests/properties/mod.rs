//! Property test modules

mod decoder_tests;
mod demux_tests;
