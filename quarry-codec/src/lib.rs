//! Streaming decoder registry for encoded and compressed record sources
//!
//! Every supported encoding resolves from a string tag to a [`Codec`],
//! which builds byte-in/byte-out decoded streams with a stable position
//! accessor. Positions are measured in decoded bytes, so offsets recorded
//! during an import line up exactly when the same source is re-decoded
//! during a search.

mod archive;
mod encode;
mod error;
mod external;
mod registry;
mod rotate;
mod stream;
mod text;
mod uu;

pub use error::{Error, Result};
pub use external::ExternalDecoder;
pub use registry::{Codec, DEFAULT_ROT, MAX_CAESAR_SHIFT};
pub use stream::DecodedStream;
