//! Candidate-image selection and local image storage.
//!
//! Two stages, used in order by the page processor:
//!
//! 1. [`picker`]: scan page markup for a small, prioritized, deduplicated
//!    set of candidate image URLs (social-preview meta tags first, then
//!    `<img>` tags in document order).
//! 2. [`store`]: download a candidate with a byte cap, validate its
//!    dimensions, re-encode it as JPEG under a stable hash-derived filename.
//!
//! Download or validation failures are one outcome class: the candidate is
//! dropped, never recorded as a failure in the resulting article.

pub mod picker;
pub mod store;

pub use picker::{DEFAULT_LIMIT, pick_candidates};
pub use store::{ImageStore, StoredImage};
