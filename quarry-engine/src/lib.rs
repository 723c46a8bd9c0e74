//! Import pipeline and search engine over the quarry catalog
//!
//! Import drives codec → splitter → tokenizer → catalog in bounded memory;
//! search resolves a term to record byte ranges and materializes them from
//! a single forward re-decode of the source. Both are cancellable at their
//! suspension points.

mod bytesize;
mod cancel;
mod error;
mod extract;
mod fixture;
mod import;
mod search;
mod separator;
mod splitter;
mod tokenizer;

pub use bytesize::parse_size;
pub use cancel::CancelFlag;
pub use error::{Error, Result};
pub use extract::{ByteRange, RangeExtractor};
pub use fixture::{GenerateOptions, GenerateSummary, generate};
pub use import::{BATCH_SIZE, DEFAULT_CHUNK_SIZE, ImportOptions, ImportSummary, run_import};
pub use search::{
    DEFAULT_LARGE_FILE_CUTOFF, SearchHit, SearchOptions, SearchSummary, run_search,
};
pub use separator::{REGEX_MARKER, Separator};
pub use splitter::{RecordSplitter, SplitRecord};
pub use tokenizer::{normalize_term, record_tokens};
