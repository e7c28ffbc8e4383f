/// The module registry the EdgeHub controller registers itself with at startup.
///
/// The source registers with a process-wide global registry; here registration is an
/// explicit call from the composition root against a collaborator, per the REDESIGN
/// FLAGS in §9. `edgehub-bus`'s bus doubles as the registry, since both describe the
/// same underlying subscription.
pub trait ModuleRegistry: Send + Sync {
    /// Registers `module_name` as a member of `module_group`, under the fixed module
    /// identity the EdgeHub controller uses for its own inbox (§6).
    fn register(&self, module_group: &str, module_name: &str);
}
