//! Avro schemas for event log topics: loading `.avsc` files, namespace
//! lookup, and validated single-datum encoding of JSON values.

mod codec;
mod convert;

pub use codec::AvroCodec;
