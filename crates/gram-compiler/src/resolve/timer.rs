//! Timers and temperatures

use gram_core::document::{QuantitySpec, QuantityValue, TemperatureNode, TimerNode};

use crate::model::{TemperatureUsage, TimerUsage, Usage, Warning, WarningCode};
use crate::sections::SectionCompiler;
use crate::units::timer_display_unit;

impl SectionCompiler<'_> {
    pub(crate) fn resolve_timer(&mut self, node: &TimerNode) -> Usage {
        let (quantity, unit) = self.measurement(node.quantity.as_ref(), "Timer", node.name.as_deref());
        Usage::Timer(TimerUsage {
            name: node.name.clone(),
            quantity,
            unit: unit.map(|u| timer_display_unit(&u).to_string()),
            is_async: node.is_async,
        })
    }

    pub(crate) fn resolve_temperature(&mut self, node: &TemperatureNode) -> Usage {
        let (quantity, unit) =
            self.measurement(node.quantity.as_ref(), "Temperature", node.name.as_deref());
        Usage::Temperature(TemperatureUsage {
            name: node.name.clone(),
            quantity,
            unit,
        })
    }

    /// Value and unit of a timer or temperature; both need a numeric value
    /// with an explicit unit
    fn measurement(
        &mut self,
        spec: Option<&QuantitySpec>,
        kind: &str,
        name: Option<&str>,
    ) -> (Option<QuantityValue>, Option<String>) {
        match spec {
            None => (None, None),
            Some(QuantitySpec::Quantity(quantity)) => {
                let unit = spec.and_then(QuantitySpec::unit).map(str::to_string);
                if unit.is_none() {
                    self.warn(Warning::item(
                        WarningCode::MissingUnit,
                        format!("{} must have an explicit unit", kind),
                        name.unwrap_or(kind),
                    ));
                }
                (quantity.value.clone(), unit)
            }
            Some(QuantitySpec::TextQuantity(text)) => {
                self.warn(Warning::item(
                    WarningCode::InvalidUnit,
                    format!("Invalid text content in {}", kind),
                    &text.value,
                ));
                (
                    Some(QuantityValue::Text {
                        value: text.value.clone(),
                    }),
                    None,
                )
            }
            Some(QuantitySpec::RelativeQuantity(relative)) => {
                self.warn(Warning::item(
                    WarningCode::InvalidUnit,
                    format!("{} cannot take a relative quantity", kind),
                    &relative.target,
                ));
                (None, None)
            }
        }
    }
}
