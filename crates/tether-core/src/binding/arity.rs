use crate::error::ArityError;

use super::FunctionBinding;

/// How call-site arguments map onto a binding's parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArityPlan {
    /// Ordinary positions filled from the call site.
    pub from_call_site: usize,
    /// Ordinary positions filled from defaults.
    pub from_defaults: usize,
    /// Arguments collected into the variadic tail.
    pub tail: usize,
}

impl FunctionBinding {
    /// Match `provided` call-site arguments against the parameter list.
    ///
    /// Missing positions must all carry defaults; the first one that does
    /// not determines the reported required count. Excess arguments are
    /// only legal with a variadic tail.
    pub fn bind_arity(&self, provided: usize) -> Result<ArityPlan, ArityError> {
        let count = self.params.len();

        if provided > count && !self.has_variadic_tail() {
            return Err(ArityError::TooMany {
                function: self.name.clone(),
                max: count,
                provided,
            });
        }

        if provided < count {
            if let Some(offset) = self.params[provided..].iter().position(|p| !p.has_default()) {
                return Err(ArityError::TooFew {
                    function: self.name.clone(),
                    required: provided + offset + 1,
                    provided,
                });
            }
        }

        Ok(ArityPlan {
            from_call_site: provided.min(count),
            from_defaults: count.saturating_sub(provided),
            tail: provided.saturating_sub(count),
        })
    }
}
