// A single opaque error type, following the same layout we use elsewhere in
// the pairwise family of crates: a public `Error` struct that wraps a private
// `ErrorKind` enum, plus one small struct per kind of failure.
//
// There are really only 2 categories of failure that a caller needs to care
// about:
// 1. configuration errors. These are fatal: the engine refuses to start
//    rather than silently mis-tag tracks.
// 2. malformed batches handed over by the ingestion boundary (a track that
//    points at a collision that isn't part of the batch).
//
// Selection rejections (a track fails a cut, a pair is a close pair, ...)
// are NOT errors and never pass through this type.

use crate::species::Role;

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

/// The underlying internal error type
#[non_exhaustive]
#[derive(Clone, Debug)]
enum ErrorKind {
    /// An error that occurs when a problematic histogram bin edge is specified
    BinEdge(BinEdgeError),
    /// An error that occurs when a configuration scalar holds a nonsensical
    /// value (e.g. a non-positive mixing bin width)
    ConfigValue(ConfigValueError),
    /// An error that occurs when 2 collisions within a batch share an id
    DuplicateEvent(DuplicateEventError),
    /// An error that occurs when a track references a collision that isn't
    /// part of the batch
    UnknownEvent(UnknownEventError),
    /// An error that occurs when a species code isn't one of the supported
    /// PDG codes
    UnsupportedSpecies(UnsupportedSpeciesError),
}

// define constructor methods for Error
impl Error {
    /// produce an error indicating that a problematic bin edge is specified
    pub(crate) fn bin_edge(who: &'static str, what: &'static str) -> Self {
        Error {
            kind: ErrorKind::BinEdge(BinEdgeError { who, what }),
        }
    }

    /// produce an error indicating that a configuration value is invalid
    pub(crate) fn config_value(name: &'static str, what: String) -> Self {
        Error {
            kind: ErrorKind::ConfigValue(ConfigValueError { name, what }),
        }
    }

    /// produce an error indicating that a collision id appears twice
    pub(crate) fn duplicate_event(event_id: i64) -> Self {
        Error {
            kind: ErrorKind::DuplicateEvent(DuplicateEventError { event_id }),
        }
    }

    /// produce an error indicating that a track's owning collision can't be
    /// resolved within the batch
    pub(crate) fn unknown_event(track_index: usize, event_id: i64) -> Self {
        Error {
            kind: ErrorKind::UnknownEvent(UnknownEventError {
                track_index,
                event_id,
            }),
        }
    }

    /// produce an error indicating that a species code isn't supported
    pub(crate) fn unsupported_species(role: Option<Role>, code: i32) -> Self {
        Error {
            kind: ErrorKind::UnsupportedSpecies(UnsupportedSpeciesError { role, code }),
        }
    }

    /// Returns `true` when the error stems from the configuration (rather
    /// than from the contents of a batch).
    ///
    /// Configuration errors are fatal: there is no point in retrying with
    /// another batch.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::BinEdge(_) | ErrorKind::ConfigValue(_) | ErrorKind::UnsupportedSpecies(_)
        )
    }
}

impl std::error::Error for Error {}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        self.kind.fmt(f)
    }
}

impl std::error::Error for ErrorKind {}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            ErrorKind::BinEdge(ref err) => err.fmt(f),
            ErrorKind::ConfigValue(ref err) => err.fmt(f),
            ErrorKind::DuplicateEvent(ref err) => err.fmt(f),
            ErrorKind::UnknownEvent(ref err) => err.fmt(f),
            ErrorKind::UnsupportedSpecies(ref err) => err.fmt(f),
        }
    }
}

/// An error that occurs when a problematic bin edge is specified
#[derive(Clone, Debug)]
struct BinEdgeError {
    who: &'static str,
    what: &'static str,
}

impl std::error::Error for BinEdgeError {}

impl core::fmt::Display for BinEdgeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let BinEdgeError { who, what } = self;
        write!(f, "problem with {who}: {what}")
    }
}

/// An error that occurs when a configuration value is invalid
#[derive(Clone, Debug)]
struct ConfigValueError {
    name: &'static str,
    what: String,
}

impl std::error::Error for ConfigValueError {}

impl core::fmt::Display for ConfigValueError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid value for \"{}\": {}", self.name, self.what)
    }
}

/// An error that occurs when 2 collisions within a batch share an id
#[derive(Clone, Debug)]
struct DuplicateEventError {
    event_id: i64,
}

impl std::error::Error for DuplicateEventError {}

impl core::fmt::Display for DuplicateEventError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "the collision id {} appears more than once in the batch",
            self.event_id
        )
    }
}

/// An error that occurs when a track references a collision that isn't part
/// of the batch
#[derive(Clone, Debug)]
struct UnknownEventError {
    track_index: usize,
    event_id: i64,
}

impl std::error::Error for UnknownEventError {}

impl core::fmt::Display for UnknownEventError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "track {} references collision {}, which isn't part of the batch",
            self.track_index, self.event_id
        )
    }
}

/// An error that occurs when a species code isn't supported
#[derive(Clone, Debug)]
struct UnsupportedSpeciesError {
    role: Option<Role>,
    code: i32,
}

impl std::error::Error for UnsupportedSpeciesError {}

impl core::fmt::Display for UnsupportedSpeciesError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let who = match self.role {
            Some(Role::First) => "the first particle",
            Some(Role::Second) => "the second particle",
            None => "the rejected particle",
        };
        write!(
            f,
            "PDG code {} of {} is not supported. Choices include: 211 (pion), \
             321 (kaon), 2212 (proton), 1000010020 (deuteron)",
            self.code, who
        )
    }
}
