//! Error types for entity resolution, statement compilation and materialization.

use std::fmt;

/// The primary error type for all sqlentity operations.
#[derive(Debug)]
pub enum Error {
    /// Entity declarations are incomplete or inconsistent
    Declaration(DeclarationError),
    /// An attribute, alias or column reference could not be found
    Lookup(LookupError),
    /// A public entry point received an unusable argument
    Argument(ArgumentError),
    /// Value conversion errors during materialization
    Type(TypeError),
    /// Business rule failures raised by collaborating layers
    Business(BusinessError),
}

#[derive(Debug)]
pub struct DeclarationError {
    pub kind: DeclarationErrorKind,
    /// The entity whose declaration is at fault
    pub entity: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationErrorKind {
    /// A declared primary key names a property that does not exist
    MissingPrimaryKey,
    /// A structure type has no table type declaration
    MissingTableType,
    /// A relation property has no join declaration
    MissingRelation,
    /// Auto-increment declared on a key that is not a single column
    InvalidAutoNumber,
    /// A related attribute names a column missing on the related entity
    UnknownColumn,
    /// A relation graph refers back to one of its own ancestors
    CyclicRelation,
    /// A relation graph is nested deeper than the configured limit
    RelationDepth,
    /// Two relations join the same table under the same exposed name
    DuplicateLocation,
}

#[derive(Debug)]
pub struct LookupError {
    pub kind: LookupErrorKind,
    /// The property, alias or column that was looked up
    pub property: String,
    /// The entity it was looked up on
    pub entity: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupErrorKind {
    /// No attribute with this reference name exists
    Attribute,
    /// A relation refers to a location that has not been joined yet
    Location,
    /// No column with a matching physical name exists on the counterpart
    Column,
    /// The entity type has no accessor value for this property
    Accessor,
}

#[derive(Debug)]
pub struct ArgumentError {
    /// Name of the offending argument
    pub argument: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

/// Validation failures reported by a collaborator for a specific entity.
#[derive(Debug, Clone)]
pub struct BusinessError {
    /// The entity that failed validation
    pub entity: String,
    /// Human-readable messages, one per failed rule
    pub messages: Vec<String>,
}

impl BusinessError {
    /// Create an empty business error for the given entity.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            messages: Vec::new(),
        }
    }

    /// Add a message.
    pub fn add(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// Check if any messages were recorded.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Convert to Result, returning Ok(()) if no messages, Err(self) otherwise.
    pub fn into_result(self) -> std::result::Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl Error {
    /// Build a declaration error.
    pub fn declaration(
        kind: DeclarationErrorKind,
        entity: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Declaration(DeclarationError {
            kind,
            entity: entity.into(),
            message: message.into(),
        })
    }

    /// Build a lookup error.
    pub fn lookup(
        kind: LookupErrorKind,
        property: impl Into<String>,
        entity: impl Into<String>,
    ) -> Self {
        Error::Lookup(LookupError {
            kind,
            property: property.into(),
            entity: entity.into(),
        })
    }

    /// Build an argument error.
    pub fn argument(argument: &'static str, message: impl Into<String>) -> Self {
        Error::Argument(ArgumentError {
            argument,
            message: message.into(),
        })
    }

    /// Is this caused by an entity declaration rather than by the caller?
    pub fn is_declaration_error(&self) -> bool {
        matches!(self, Error::Declaration(_))
    }

    /// The declaration error kind, if this is a declaration error.
    pub fn declaration_kind(&self) -> Option<DeclarationErrorKind> {
        match self {
            Error::Declaration(e) => Some(e.kind),
            _ => None,
        }
    }

    /// The lookup error kind, if this is a lookup error.
    pub fn lookup_kind(&self) -> Option<LookupErrorKind> {
        match self {
            Error::Lookup(e) => Some(e.kind),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Declaration(e) => write!(f, "Declaration error: {}", e),
            Error::Lookup(e) => write!(f, "Lookup error: {}", e),
            Error::Argument(e) => write!(f, "Argument error: {}", e),
            Error::Type(e) => write!(f, "Type error: {}", e),
            Error::Business(e) => write!(f, "Business error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Display for DeclarationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.entity)
    }
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            LookupErrorKind::Attribute => write!(
                f,
                "no attribute '{}' is defined on '{}'",
                self.property, self.entity
            ),
            LookupErrorKind::Location => write!(
                f,
                "'{}' has not been joined to '{}' before it is referenced",
                self.property, self.entity
            ),
            LookupErrorKind::Column => write!(
                f,
                "no column matching '{}' exists on '{}'",
                self.property, self.entity
            ),
            LookupErrorKind::Accessor => write!(
                f,
                "'{}' exposes no value for property '{}'",
                self.entity, self.property
            ),
        }
    }
}

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.argument, self.message)
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(
                f,
                "expected {} for column '{}', found {}",
                self.expected, col, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl fmt::Display for BusinessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.messages.len() == 1 {
            write!(f, "'{}': {}", self.entity, self.messages[0])
        } else {
            writeln!(f, "'{}' failed validation:", self.entity)?;
            for message in &self.messages {
                writeln!(f, "  - {}", message)?;
            }
            Ok(())
        }
    }
}

impl std::error::Error for BusinessError {}

impl From<DeclarationError> for Error {
    fn from(err: DeclarationError) -> Self {
        Error::Declaration(err)
    }
}

impl From<LookupError> for Error {
    fn from(err: LookupError) -> Self {
        Error::Lookup(err)
    }
}

impl From<ArgumentError> for Error {
    fn from(err: ArgumentError) -> Self {
        Error::Argument(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl From<BusinessError> for Error {
    fn from(err: BusinessError) -> Self {
        Error::Business(err)
    }
}

/// Result type alias for sqlentity operations.
pub type Result<T> = std::result::Result<T, Error>;
