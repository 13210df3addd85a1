use super::{ComponentSpecificWriter, HookContext};
use crate::error::HookError;
use crate::registry::Collection;
use crate::writer::AssetWriter;

/// `CallAction` records end with the index of the flow they call: `i16 flow`, `u16 reserved`.
///
/// The flow is named by the component's `action` setting.
#[derive(Debug, Default, Clone, Copy)]
pub struct CallActionHook;

impl ComponentSpecificWriter for CallActionHook {
    fn class_name(&self) -> &str {
        "CallAction"
    }

    fn write(&self, ctx: &mut HookContext<'_>, writer: &mut AssetWriter) -> Result<(), HookError> {
        let action = ctx
            .component
            .settings
            .get("action")
            .and_then(|value| value.as_str())
            .ok_or_else(|| HookError::MissingSetting("action".to_string()))?;

        let flow_index = ctx
            .project
            .flows
            .iter()
            .find(|flow| flow.name == action)
            .and_then(|flow| ctx.registry.find(Collection::Flow, &flow.id))
            .ok_or_else(|| HookError::Failed(format!("Unknown action flow '{}'", action)))?;
        let flow_index = i16::try_from(flow_index)
            .map_err(|_| HookError::Failed(format!("Flow index {} out of range", flow_index)))?;

        writer.write_i16(flow_index);
        writer.write_u16(0);
        Ok(())
    }
}
