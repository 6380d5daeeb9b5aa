/// Validation errors for domain value objects and transfer options
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    // ObjectKey validation errors
    EmptyObjectKey,
    ObjectKeyTooLong {
        actual: usize,
        max: usize,
    },
    InvalidObjectKeyCharacter(char),
    ObjectKeyStartsWithSlash,
    ObjectKeyEndsWithSlash,
    ObjectKeyContainsDoubleSlash,
    ObjectKeyDotSegment(String),

    // BucketName validation errors
    BucketNameTooShort {
        actual: usize,
        min: usize,
    },
    BucketNameTooLong {
        actual: usize,
        max: usize,
    },
    BucketNameInvalidStart,
    BucketNameInvalidEnd,
    BucketNameInvalidCharacter(char),
    BucketNameConsecutiveHyphens,
    BucketNameConsecutiveDots,
    BucketNameLooksLikeIpAddress,

    // Endpoint and credential errors
    EmptyEndpoint,
    InvalidEndpoint {
        value: String,
        reason: String,
    },
    EmptyCredential(&'static str),

    // PutOptions errors
    InvalidMetadataKey(String),
    InvalidHeaderValue {
        field: String,
        value: String,
    },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ObjectKey errors
            ValidationError::EmptyObjectKey => write!(f, "Object key cannot be empty"),
            ValidationError::ObjectKeyTooLong { actual, max } => {
                write!(f, "Object key too long: {} bytes (max: {})", actual, max)
            }
            ValidationError::InvalidObjectKeyCharacter(c) => {
                write!(f, "Invalid character in object key: {:?}", c)
            }
            ValidationError::ObjectKeyStartsWithSlash => {
                write!(f, "Object key cannot start with '/'")
            }
            ValidationError::ObjectKeyEndsWithSlash => {
                write!(f, "Object key cannot end with '/'")
            }
            ValidationError::ObjectKeyContainsDoubleSlash => {
                write!(f, "Object key cannot contain '//'")
            }
            ValidationError::ObjectKeyDotSegment(segment) => {
                write!(f, "Object key cannot contain a '{}' segment", segment)
            }

            // BucketName errors
            ValidationError::BucketNameTooShort { actual, min } => {
                write!(
                    f,
                    "Bucket name too short: {} characters (min: {})",
                    actual, min
                )
            }
            ValidationError::BucketNameTooLong { actual, max } => {
                write!(
                    f,
                    "Bucket name too long: {} characters (max: {})",
                    actual, max
                )
            }
            ValidationError::BucketNameInvalidStart => {
                write!(f, "Bucket name must start with lowercase letter or number")
            }
            ValidationError::BucketNameInvalidEnd => {
                write!(f, "Bucket name must end with lowercase letter or number")
            }
            ValidationError::BucketNameInvalidCharacter(c) => {
                write!(
                    f,
                    "Invalid character in bucket name: '{}'. Only lowercase letters, numbers, dots and hyphens allowed",
                    c
                )
            }
            ValidationError::BucketNameConsecutiveHyphens => {
                write!(f, "Bucket name cannot contain consecutive hyphens")
            }
            ValidationError::BucketNameConsecutiveDots => {
                write!(f, "Bucket name cannot contain consecutive dots")
            }
            ValidationError::BucketNameLooksLikeIpAddress => {
                write!(f, "Bucket name cannot be formatted as an IP address")
            }

            // Endpoint and credential errors
            ValidationError::EmptyEndpoint => write!(f, "Endpoint cannot be empty"),
            ValidationError::InvalidEndpoint { value, reason } => {
                write!(f, "Invalid endpoint '{}': {}", value, reason)
            }
            ValidationError::EmptyCredential(which) => {
                write!(f, "Credential '{}' cannot be empty", which)
            }

            // PutOptions errors
            ValidationError::InvalidMetadataKey(key) => {
                write!(
                    f,
                    "Invalid user metadata key '{}': only ASCII letters, digits, '-' and '_' allowed",
                    key
                )
            }
            ValidationError::InvalidHeaderValue { field, value } => {
                write!(
                    f,
                    "Invalid value for '{}': {:?} contains control characters",
                    field, value
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}
