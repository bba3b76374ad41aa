use crate::domain::model::TenantId;
use crate::domain::ports::TenantContext;
use crate::utils::error::Result;

/// Active tenant switch. Dropping the scope restores the tenant that was
/// current before `enter`, on every exit path.
pub struct TenantScope<'a> {
    context: &'a dyn TenantContext,
    tenant: TenantId,
}

impl<'a> TenantScope<'a> {
    pub fn enter(context: &'a dyn TenantContext, tenant: TenantId) -> Result<Self> {
        context.switch_to(tenant)?;
        tracing::debug!("🔀 Switched to tenant {}", tenant);
        Ok(Self { context, tenant })
    }

    pub fn tenant(&self) -> TenantId {
        self.tenant
    }

    /// Leaves the scope now instead of at end of block.
    pub fn exit(self) {}
}

impl Drop for TenantScope<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.context.restore_previous() {
            tracing::error!("❌ Failed to restore tenant after {}: {}", self.tenant, e);
        } else {
            tracing::debug!("🔀 Left tenant {}", self.tenant);
        }
    }
}
