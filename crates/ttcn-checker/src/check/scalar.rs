//! Integer and float templates.

use ttcn_core::{CheckError, Folded, TemplateId, TypeDef, TypeKind, Value};

use crate::context::{Checker, Result};
use crate::template::TemplateKind;

impl<'a> Checker<'a> {
    /// Integer and float governors accept value ranges besides specific values.
    pub(super) fn check_numeric(&mut self, id: TemplateId, gdef: &TypeDef) -> Result<()> {
        let TemplateKind::Range(range) = self.kind(id)? else {
            return self.illegal_matching(id, gdef);
        };
        let integer = matches!(gdef.kind, TypeKind::Integer);

        let lower = self.numeric_bound(id, range.min.as_ref(), integer)?;
        let upper = self.numeric_bound(id, range.max.as_ref(), integer)?;

        if integer {
            if range.min.is_none() && range.min_exclusive {
                self.error_at(
                    id,
                    CheckError::ExcludedInfinity {
                        which: "lower",
                        sign: "-",
                    },
                )?;
            }
            if range.max.is_none() && range.max_exclusive {
                self.error_at(
                    id,
                    CheckError::ExcludedInfinity {
                        which: "upper",
                        sign: "",
                    },
                )?;
            }
        }

        let inverted = match (&lower, &upper) {
            (Some(Value::Integer(l)), Some(Value::Integer(u))) => l > u,
            (Some(Value::Real(l)), Some(Value::Real(u))) => l > u,
            _ => false,
        };
        if inverted {
            self.error_at(id, CheckError::RangeBounds)?;
        }
        Ok(())
    }

    /// Fold a range bound; `None` when it is infinite, unknown or erroneous.
    fn numeric_bound(
        &mut self,
        id: TemplateId,
        bound: Option<&Value>,
        integer: bool,
    ) -> Result<Option<Value>> {
        let Some(bound) = bound else {
            return Ok(None);
        };
        let expected = if integer { "integer" } else { "float" };
        match self.folder().fold(bound) {
            Folded::Constant(v @ Value::Integer(_)) if integer => Ok(Some(v)),
            Folded::Constant(v @ Value::Real(_)) if !integer => Ok(Some(v)),
            Folded::Constant(Value::Error) | Folded::Unfoldable => Ok(None),
            Folded::Constant(_) => {
                self.error_at(id, CheckError::ValueKindMismatch { expected })?;
                Ok(None)
            }
            Folded::Invalid(message) => {
                self.error_at(id, CheckError::Other(message))?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::check::CheckOptions;
    use crate::template::{TemplateKind, ValueRange};
    use crate::test_support::Fixture;
    use ttcn_core::{TypeHash, Value};

    fn range(min: Option<Value>, max: Option<Value>) -> TemplateKind {
        TemplateKind::Range(ValueRange::new(min, max))
    }

    #[test]
    fn inverted_integer_range_is_an_error() {
        let mut fx = Fixture::new();
        let id = fx.add(range(Some(Value::Integer(10)), Some(Value::Integer(5))));
        fx.check(id, Fixture::int(), CheckOptions::top_level(false));
        assert!(fx.diags.mentions("The lower boundary is higher than the upper boundary"));
    }

    #[test]
    fn ordered_range_is_accepted() {
        let mut fx = Fixture::new();
        let id = fx.add(range(Some(Value::Integer(1)), None));
        fx.check(id, Fixture::int(), CheckOptions::top_level(false));
        assert!(fx.diags.is_empty());
    }

    #[test]
    fn excluded_infinity_on_integer() {
        let mut fx = Fixture::new();
        let id = fx.add(TemplateKind::Range(
            ValueRange::new(None, Some(Value::Integer(3))).exclusive(true, false),
        ));
        fx.check(id, Fixture::int(), CheckOptions::top_level(false));
        assert!(fx.diags.mentions("-infinity cannot be excluded"));
    }

    #[test]
    fn float_range_rejects_integer_bound() {
        let mut fx = Fixture::new();
        let id = fx.add(range(Some(Value::Integer(1)), Some(Value::real(2.0))));
        fx.check(id, TypeHash::from_name("float"), CheckOptions::top_level(false));
        assert!(fx.diags.mentions("float value was expected"));
    }

    #[test]
    fn pattern_is_illegal_for_integer() {
        let mut fx = Fixture::new();
        let id = fx.add(TemplateKind::BitPattern("1*".into()));
        fx.check(id, Fixture::int(), CheckOptions::top_level(false));
        assert!(fx.diags.mentions("bitstring pattern cannot be used for type `integer'"));
    }
}
