//! Virtlens observer - watches virtual machines and reports their effective state

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Pod;
use kube::runtime::reflector::store::Writer;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::{reflector, watcher, Controller, WatchStreamExt};
use kube::{Api, Client, CustomResourceExt, Resource};
use serde::de::DeserializeOwned;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use virtlens::controller::{error_policy, reconcile, Context, SnapshotSourceImpl};
use virtlens::crd::{
    ResourceQuota, VirtualMachine, VirtualMachineImage, VirtualMachineInstance,
    VirtualMachineRestore,
};
use virtlens::DEFAULT_REQUEUE_SECS;

/// Label selecting KubeVirt launcher pods
const LAUNCHER_POD_SELECTOR: &str = "kubevirt.io=virt-launcher";

/// Virtlens - status observer for KubeVirt-style virtual machines
#[derive(Parser, Debug)]
#[command(name = "virtlens", version, about, long_about = None)]
struct Cli {
    /// Generate CRD manifests and exit
    #[arg(long)]
    crd: bool,

    /// Namespace to watch; all namespaces when unset
    #[arg(long, env = "VIRTLENS_NAMESPACE")]
    namespace: Option<String>,

    /// Seconds between periodic re-evaluations of a machine
    #[arg(long, env = "VIRTLENS_REQUEUE_SECS", default_value_t = DEFAULT_REQUEUE_SECS)]
    requeue_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.crd {
        print_crds()?;
        return Ok(());
    }

    run_observer(cli).await
}

/// Dump the CRD schemas of every watched custom resource
fn print_crds() -> anyhow::Result<()> {
    let crds = [
        serde_yaml::to_string(&VirtualMachine::crd()),
        serde_yaml::to_string(&VirtualMachineInstance::crd()),
        serde_yaml::to_string(&VirtualMachineImage::crd()),
        serde_yaml::to_string(&VirtualMachineRestore::crd()),
        serde_yaml::to_string(&ResourceQuota::crd()),
    ]
    .into_iter()
    .collect::<Result<Vec<_>, _>>()
    .map_err(|e| anyhow::anyhow!("Failed to serialize CRD: {}", e))?;

    println!("{}", crds.join("---\n"));
    Ok(())
}

/// Build an Api handle scoped to the requested namespace
fn scoped_api<K>(client: &Client, namespace: Option<&str>) -> Api<K>
where
    K: Resource<Scope = k8s_openapi::NamespaceResourceScope>,
    K::DynamicType: Default,
{
    match namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    }
}

/// Drive a reflector for one resource type on a background task
///
/// The store stays current as long as the task runs; watch errors are
/// logged and the stream restarts with backoff.
fn spawn_watch<K>(api: Api<K>, writer: Writer<K>, config: WatcherConfig, resource: &'static str)
where
    K: Resource + Clone + std::fmt::Debug + DeserializeOwned + Send + Sync + 'static,
    K::DynamicType: Default + Eq + std::hash::Hash + Clone,
{
    let stream = reflector(writer, watcher(api, config).default_backoff());

    tokio::spawn(async move {
        let mut events = std::pin::pin!(stream.applied_objects());
        while let Some(event) = events.next().await {
            if let Err(error) = event {
                tracing::warn!(%error, resource, "watch stream error");
            }
        }
    });
}

/// Run in observer mode - watches machines and logs their state
///
/// Four watchers (machines, instances, launcher pods, restores) feed
/// reflector stores; the controller loop re-evaluates a machine on every
/// event and on a periodic requeue. Nothing is ever written back.
async fn run_observer(cli: Cli) -> anyhow::Result<()> {
    tracing::info!("virtlens observer starting...");

    let client = Client::try_default()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create Kubernetes client: {}", e))?;

    let namespace = cli.namespace.as_deref();
    let vms: Api<VirtualMachine> = scoped_api(&client, namespace);
    let instances: Api<VirtualMachineInstance> = scoped_api(&client, namespace);
    let pods: Api<Pod> = scoped_api(&client, namespace);
    let restores: Api<VirtualMachineRestore> = scoped_api(&client, namespace);

    let (vm_store, vm_writer) = reflector::store();
    let (instance_store, instance_writer) = reflector::store();
    let (pod_store, pod_writer) = reflector::store();
    let (restore_store, restore_writer) = reflector::store();

    spawn_watch(vms.clone(), vm_writer, WatcherConfig::default(), "virtualmachines");
    spawn_watch(
        instances,
        instance_writer,
        WatcherConfig::default(),
        "virtualmachineinstances",
    );
    spawn_watch(
        pods,
        pod_writer,
        WatcherConfig::default().labels(LAUNCHER_POD_SELECTOR),
        "pods",
    );
    spawn_watch(
        restores,
        restore_writer,
        WatcherConfig::default(),
        "virtualmachinerestores",
    );

    let source = SnapshotSourceImpl::new(vm_store, instance_store, pod_store, restore_store);
    let ctx = Arc::new(Context::new(
        Arc::new(source),
        Duration::from_secs(cli.requeue_secs),
    ));

    match namespace {
        Some(ns) => tracing::info!(namespace = %ns, "watching one namespace"),
        None => tracing::info!("watching all namespaces"),
    }

    Controller::new(vms, WatcherConfig::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok(object) => {
                    tracing::debug!(?object, "reconciliation completed");
                }
                Err(e) => {
                    tracing::error!(error = ?e, "reconciliation error");
                }
            }
        })
        .await;

    tracing::info!("virtlens observer shutting down");
    Ok(())
}
