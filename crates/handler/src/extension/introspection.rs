use error::GraphqlResult;

use crate::OperationContext;

use super::{Extension, ExtensionHooks};

/// Allows introspection queries. Operations start with introspection disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct Introspection;

impl Extension for Introspection {
    fn name(&self) -> &str {
        "Introspection"
    }

    fn hooks(&self) -> ExtensionHooks {
        ExtensionHooks::OPERATION_CONTEXT
    }

    fn mutate_operation_context(&self, operation: &mut OperationContext) -> GraphqlResult<()> {
        operation.disable_introspection = false;
        Ok(())
    }
}
