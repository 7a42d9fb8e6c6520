//! # keytree - composite configuration keys
//!
//! Flat configuration stores address every value by a dotted key such as
//! `database.server(1)[@port]`. `keytree` parses and compares these keys and turns an ordered list
//! of them back into the tree they describe.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `keytree` works internally.
//!
//! ### Key syntax
//!
//! A key is a list of segments:
//! - segments are separated by `.`
//! - `..` is a literal `.` inside a segment name
//! - `[@name]` is an attribute segment (`a[@b]` and `a.[@b]` are the same two segments)
//! - `name(3)` is an element with index `3`
//!
//! Malformed decoration (an unmatched `[@`, a non-numeric index) is read as plain text. Parsing a
//! key never fails.
//!
//! ### Key paths
//!
//! see [key_path::KeyPath]
//!
//! A [key_path::KeyPath] owns the key text. It is built with `append*` calls and read with a
//! [key_path::KeyPathIter] which yields [key_path::Segment]s. Two keys are compared segment by
//! segment ([key_path::KeyPath::common_key], [key_path::KeyPath::difference_key]). Segments are
//! equal when name, index and attribute-ness all match.
//!
//! ### Projection
//!
//! see [projector::TreeProjector]
//!
//! **Example**
//!
//! | **key**          | **value**    |
//! |------------------|--------------|
//! | `db.host`        | `"localhost"`|
//! | `db.port(0)`     | `5432`       |
//! | `db.user[@role]` | `"admin"`    |
//!
//! **Events**
//!
//! ```text
//! elementStart(db, null)
//!   elementStart(host, "localhost") elementEnd(host)
//!   elementStart(port, 5432) elementEnd(port)
//!   elementStart(user, null)
//!     elementStart([@role], "admin") elementEnd([@role])
//!   elementEnd(user)
//! elementEnd(db)
//! ```
//!
//! For every key the projector closes what the previous key opened below their shared prefix,
//! opens the new ancestors and emits the leaf. A list value emits the leaf once per entry.
//!
//! ### Output
//!
//! Events go to an [sink::EventSink]. [sink::EventRecorder] keeps them as a list,
//! [sink::TreeBuilder] assembles a [sink::Node] tree which serializes via [serde].
//!
pub mod key_path;
pub mod projector;
pub mod sink;
pub mod value;
