use core::fmt;

use crate::cfg::field::ConfigField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Value does not fit the field buffer, the field kept its previous value
    ConfigValueTooLong {
        field: ConfigField,
        len: usize,
        max: usize,
    },
    /// All subscription slots are taken
    RegistryFull { capacity: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigValueTooLong { field, len, max } => write!(
                f,
                "Value for {field} is {len} bytes long, at most {max} bytes allowed"
            ),
            Self::RegistryFull { capacity } => {
                write!(f, "Subscription registry full ({capacity} topics)")
            }
        }
    }
}

/// Fields refused by a provisioning pass. The remaining fields were applied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rejected {
    errors: heapless::Vec<Error, { ConfigField::COUNT }>,
}

impl Rejected {
    pub(crate) fn push(&mut self, error: Error) {
        // one entry per field, the last offending value wins
        if let Error::ConfigValueTooLong { field, .. } = error {
            self.errors.retain(|known| match known {
                Error::ConfigValueTooLong { field: seen, .. } => *seen != field,
                Error::RegistryFull { .. } => true,
            });
        }
        if self.errors.push(error).is_err() {
            log::error!("[CFG] Rejection list overflow: {error}");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Error> {
        self.errors.iter()
    }

    pub fn fields(&self) -> impl Iterator<Item = ConfigField> + '_ {
        self.errors.iter().filter_map(|error| match error {
            Error::ConfigValueTooLong { field, .. } => Some(*field),
            Error::RegistryFull { .. } => None,
        })
    }

    pub fn contains(&self, field: ConfigField) -> bool {
        self.fields().any(|rejected| rejected == field)
    }
}

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} field(s) rejected", self.errors.len())?;
        for error in &self.errors {
            write!(f, "; {error}")?;
        }
        Ok(())
    }
}
