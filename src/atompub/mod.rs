//! The AtomPub wire layer: decoding, entry writing and URI construction.

pub mod constants;
pub mod parser;
pub mod uri;
pub mod writer;

pub use parser::{
    DecodeError, decode_allowable_actions, decode_feed, decode_object_entry, decode_repository_info,
    decode_service_document,
};
pub use uri::{
    IncludeRelationships, ObjectByIdUriBuilder, ObjectFetchOptions, ReturnVersion, UnfileObject, append_query_param,
};
