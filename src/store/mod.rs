//! In-memory snapshot of watched resources
//!
//! The status engine is a pure function over cluster state, so the state
//! itself lives here: one `Snapshot` holds the machines and their satellite
//! resources, and a [`VmView`] bundles everything one evaluation needs.
//! Lookups are by namespace-qualified key; an instance shares its machine's
//! key, launcher pods index under the instance that owns them.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;

use crate::crd::{
    ResourceQuota, VirtualMachine, VirtualMachineImage, VirtualMachineInstance,
    VirtualMachineRestore,
};
use crate::status::pod::{classify, PodSummary};

/// Owner kind that marks a pod as an instance's launcher
const LAUNCHER_OWNER_KIND: &str = "VirtualMachineInstance";

/// Namespace-qualified resource key
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey {
    /// Namespace the object lives in
    pub namespace: String,

    /// Object name
    pub name: String,
}

impl ObjectKey {
    /// Build a key from parts
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key of a live object; cluster-scoped objects key under an empty
    /// namespace
    pub fn of(object: &impl ResourceExt) -> Self {
        Self::new(object.namespace().unwrap_or_default(), object.name_any())
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Point-in-time collection of everything the engine evaluates
#[derive(Debug, Default)]
pub struct Snapshot {
    vms: BTreeMap<ObjectKey, VirtualMachine>,
    instances: BTreeMap<ObjectKey, VirtualMachineInstance>,
    pods: BTreeMap<ObjectKey, PodSummary>,
    restores: BTreeMap<ObjectKey, VirtualMachineRestore>,
    quotas: BTreeMap<String, ResourceQuota>,
    images: BTreeMap<ObjectKey, VirtualMachineImage>,
    upload_errors: BTreeMap<ObjectKey, String>,
}

impl Snapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a machine
    pub fn upsert_vm(&mut self, vm: VirtualMachine) {
        self.vms.insert(ObjectKey::of(&vm), vm);
    }

    /// Remove a machine
    pub fn remove_vm(&mut self, key: &ObjectKey) {
        self.vms.remove(key);
    }

    /// Insert or replace an instance; it keys under its machine's key
    pub fn upsert_instance(&mut self, instance: VirtualMachineInstance) {
        self.instances.insert(ObjectKey::of(&instance), instance);
    }

    /// Remove an instance
    pub fn remove_instance(&mut self, key: &ObjectKey) {
        self.instances.remove(key);
    }

    /// Classify a launcher pod and index it under its owning instance
    ///
    /// Pods whose first owner is not an instance are ignored.
    pub fn upsert_pod(&mut self, pod: &Pod) {
        if let Some(key) = launcher_owner(pod) {
            self.pods.insert(key, classify(pod));
        }
    }

    /// Drop the summary a launcher pod contributed
    pub fn remove_pod(&mut self, pod: &Pod) {
        if let Some(key) = launcher_owner(pod) {
            self.pods.remove(&key);
        }
    }

    /// Insert or replace a restore operation
    pub fn upsert_restore(&mut self, restore: VirtualMachineRestore) {
        self.restores.insert(ObjectKey::of(&restore), restore);
    }

    /// Remove a restore operation
    pub fn remove_restore(&mut self, key: &ObjectKey) {
        self.restores.remove(key);
    }

    /// Insert or replace the resource quota of a namespace
    pub fn upsert_quota(&mut self, quota: ResourceQuota) {
        self.quotas
            .insert(quota.namespace().unwrap_or_default(), quota);
    }

    /// Remove the resource quota of a namespace
    pub fn remove_quota(&mut self, namespace: &str) {
        self.quotas.remove(namespace);
    }

    /// Insert or replace an image
    pub fn upsert_image(&mut self, image: VirtualMachineImage) {
        self.images.insert(ObjectKey::of(&image), image);
    }

    /// Remove an image along with any recorded upload failure
    pub fn remove_image(&mut self, key: &ObjectKey) {
        self.images.remove(key);
        self.upload_errors.remove(key);
    }

    /// Record an upload failure observed for an image
    pub fn record_upload_error(&mut self, key: ObjectKey, message: impl Into<String>) {
        self.upload_errors.insert(key, message.into());
    }

    /// Clear a recorded upload failure
    pub fn clear_upload_error(&mut self, key: &ObjectKey) {
        self.upload_errors.remove(key);
    }

    /// Upload failure recorded for an image, if any
    pub fn upload_error(&self, key: &ObjectKey) -> Option<&str> {
        self.upload_errors.get(key).map(String::as_str)
    }

    /// Look up an image
    pub fn image(&self, key: &ObjectKey) -> Option<&VirtualMachineImage> {
        self.images.get(key)
    }

    /// Iterate images in key order
    pub fn images(&self) -> impl Iterator<Item = (&ObjectKey, &VirtualMachineImage)> {
        self.images.iter()
    }

    /// View of one machine together with its satellite resources
    pub fn vm_view(&self, key: &ObjectKey) -> Option<VmView<'_>> {
        self.vms.get(key).map(|vm| self.view_of(key, vm))
    }

    /// Iterate views over every machine, in key order
    pub fn views(&self) -> impl Iterator<Item = VmView<'_>> {
        self.vms.iter().map(|(key, vm)| self.view_of(key, vm))
    }

    /// Number of machines tracked
    pub fn vm_count(&self) -> usize {
        self.vms.len()
    }

    /// Whether a machine with this key is tracked
    pub fn contains_vm(&self, key: &ObjectKey) -> bool {
        self.vms.contains_key(key)
    }

    fn view_of<'a>(&'a self, key: &ObjectKey, vm: &'a VirtualMachine) -> VmView<'a> {
        let restore = vm
            .restore_name()
            .and_then(|name| self.restores.get(&ObjectKey::new(&key.namespace, name)));

        VmView {
            vm,
            instance: self.instances.get(key),
            pod: self.pods.get(key),
            restore,
            quota: self.quotas.get(&key.namespace),
        }
    }
}

/// One machine with the satellite resources its status depends on
///
/// Borrowed out of a [`Snapshot`]; absent satellites are simply `None` and
/// the evaluators treat them as such.
#[derive(Clone, Copy, Debug)]
pub struct VmView<'a> {
    /// The machine itself
    pub vm: &'a VirtualMachine,

    /// Its live instance, when one exists
    pub instance: Option<&'a VirtualMachineInstance>,

    /// Launcher pod summary for the instance
    pub pod: Option<&'a PodSummary>,

    /// Restore operation linked through the restore annotation
    pub restore: Option<&'a VirtualMachineRestore>,

    /// Resource quota declared for the namespace
    pub quota: Option<&'a ResourceQuota>,
}

impl VmView<'_> {
    /// Snapshot-size quota configured for this machine, in bytes
    pub fn snapshot_size_quota(&self) -> Option<i64> {
        let name = self.vm.name_any();

        self.quota
            .and_then(|quota| quota.snapshot_size_quota(&name))
    }
}

fn launcher_owner(pod: &Pod) -> Option<ObjectKey> {
    let owner = pod.metadata.owner_references.as_ref()?.first()?;

    if owner.kind != LAUNCHER_OWNER_KIND {
        return None;
    }

    Some(ObjectKey::new(
        pod.metadata.namespace.clone().unwrap_or_default(),
        owner.name.clone(),
    ))
}
