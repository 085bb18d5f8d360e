//! Request channel: client input → validated action requests.
//!
//! Everything arriving here is client-trusted except the [`ClientId`], which
//! the transport stamps. [`RequestValidator`] turns a [`WireActionRequest`]
//! into an [`ActionRequest`](game_core::ActionRequest) or a [`ProtocolError`].

mod request;

pub use request::{
    ClientId, InputEdge, ProtocolError, RequestValidator, Sessions, WireActionRequest,
};
