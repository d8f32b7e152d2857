//! Credential discovery for the control-plane API.

use std::future::Future;
use std::path::Path;

use kube::config::{KubeConfigOptions, Kubeconfig};

use crate::config::resolver::BoxError;

/// Source of `kube::Config` values.
///
/// The builder only decides *which* method to call; implementations do the
/// actual loading. Tests substitute fakes here.
pub trait CredentialLoader: Send + Sync {
    /// Load the current context of a kubeconfig file.
    fn load_kubeconfig(
        &self,
        path: &Path,
    ) -> impl Future<Output = Result<kube::Config, BoxError>> + Send;

    /// Discover in-cluster service account credentials.
    fn in_cluster(&self) -> Result<kube::Config, BoxError>;
}

/// Loader backed by the `kube` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct KubeCredentials;

impl CredentialLoader for KubeCredentials {
    async fn load_kubeconfig(&self, path: &Path) -> Result<kube::Config, BoxError> {
        let kubeconfig = Kubeconfig::read_from(path)?;
        let config =
            kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await?;
        Ok(config)
    }

    fn in_cluster(&self) -> Result<kube::Config, BoxError> {
        Ok(kube::Config::incluster()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
clusters:
- name: test
  cluster:
    server: https://127.0.0.1:6443
    insecure-skip-tls-verify: true
contexts:
- name: test
  context:
    cluster: test
    user: test
    namespace: agents
current-context: test
users:
- name: test
  user:
    token: not-a-real-token
"#;

    #[tokio::test]
    async fn test_loads_current_context() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(KUBECONFIG.as_bytes()).unwrap();

        let config = KubeCredentials.load_kubeconfig(file.path()).await.unwrap();
        assert_eq!(config.cluster_url.host(), Some("127.0.0.1"));
        assert_eq!(config.cluster_url.port_u16(), Some(6443));
        assert_eq!(config.default_namespace, "agents");
    }

    #[tokio::test]
    async fn test_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");

        assert!(KubeCredentials.load_kubeconfig(&missing).await.is_err());
    }

    #[tokio::test]
    async fn test_malformed_file_fails() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"clusters: [this is: not valid").unwrap();

        assert!(KubeCredentials.load_kubeconfig(file.path()).await.is_err());
    }
}
