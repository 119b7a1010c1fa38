/*!
Error report printed when the command-line driver fails.
*/

use std::error::Error as StdError;

/// Boxed error returned from `main`.
///
/// `main` prints the `Debug` form of its error, so `Debug` renders the
/// message followed by every `source()` in the chain.
pub struct Report(Box<dyn StdError>);

impl Report {
    /// Iterates over the causes of the error, nearest first.
    pub fn causes(&self) -> impl Iterator<Item = &(dyn StdError + 'static)> {
        std::iter::successors(self.0.source(), |&cause| cause.source())
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Debug for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self)?;

        let mut causes = self.causes().enumerate().peekable();
        if causes.peek().is_some() {
            writeln!(f, "\nCaused by:")?;
        }
        for (depth, cause) in causes {
            writeln!(f, "  {}: {}", depth, cause)?;
        }

        Ok(())
    }
}

impl<E: Into<Box<dyn StdError>>> From<E> for Report {
    fn from(e: E) -> Self {
        Report(e.into())
    }
}
