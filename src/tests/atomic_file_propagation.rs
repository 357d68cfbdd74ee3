// End to end through the external command minter: a shell script stands in
// for scitokens-admin-create-token and records the arguments it received.

#[cfg(test)]
mod tests {
    use crate::cache::credential::CredentialStatus;
    use crate::cache::token_cache::TokenCache;
    use crate::config::issuer::ServiceConfig;
    use crate::config::proc_initiator::initiate_default_values;
    use crate::tests::common::{entry, file_names, mode, write_script};

    fn service_config(cache_dir: &std::path::Path, command: String) -> ServiceConfig {
        let mut cfg = ServiceConfig::default();
        cfg.settings.cache.dir = cache_dir.to_string_lossy().into_owned();
        cfg.issuer.command = command;
        cfg.issuer.command_timeout_seconds = 5;
        initiate_default_values(cfg)
    }

    #[tokio::test]
    async fn command_output_lands_in_token_file() {
        let root = tempfile::tempdir().unwrap();
        let cache_dir = root.path().join("tokens.d");
        let args_file = root.path().join("args");
        let body = format!(
            "printf '%s\\n' \"$@\" > {}\necho eyJhbGciOiJFUzI1NiJ9.e30.c2ln",
            args_file.display()
        );
        let script = write_script(root.path(), "create-token.sh", &body);
        let cache = TokenCache::from_config(&service_config(&cache_dir, script));

        let cred = cache
            .get_credential("group1", &entry("entry1", "condor some.host.example:9618"), None)
            .await;

        assert_eq!(cred.status, CredentialStatus::Minted);
        assert_eq!(cred.token, "eyJhbGciOiJFUzI1NiJ9.e30.c2ln");
        assert_eq!(cred.lifetime_seconds, 3600);

        let path = cache_dir.join("group1.entry1.scitoken");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "eyJhbGciOiJFUzI1NiJ9.e30.c2ln");
        assert_eq!(mode(&path), 0o600);
        assert_eq!(mode(&cache_dir), 0o700);
        assert_eq!(file_names(&cache_dir), vec!["group1.entry1.scitoken"]);

        let args = std::fs::read_to_string(&args_file).unwrap();
        let args: Vec<&str> = args.lines().collect();
        assert_eq!(&args[..8], &[
            "--keyfile", "/etc/condor/scitokens.pem",
            "--key_id", "1234",
            "--issuer", "https://scitokens.org/osg-connect",
            "--lifetime", "3600",
        ]);
        assert!(args.contains(&"sub=vofrontend-entry1"));
        assert!(args.contains(&"aud=some.host.example:9618"));
        assert!(args.contains(&"scope=compute.read compute.modify compute.create compute.cancel"));
        assert!(args.contains(&"wlcg.ver=1.0"));
    }

    #[tokio::test]
    async fn failing_command_does_not_raise_and_leaves_no_temp_file() {
        let root = tempfile::tempdir().unwrap();
        let cache_dir = root.path().join("tokens.d");
        let script = write_script(root.path(), "create-token.sh", "echo 'cannot open key' >&2; exit 1");
        let cache = TokenCache::from_config(&service_config(&cache_dir, script));

        let cred = cache
            .get_credential("group1", &entry("entry1", "condor some.host.example:9618"), None)
            .await;

        assert!(matches!(cred.status, CredentialStatus::Failed(_)));
        assert_eq!(cred.clone().into_pair(), (String::new(), 3600));
        assert!(cred.error().unwrap().to_string().contains("cannot open key"));
        assert!(file_names(&cache_dir).is_empty());
    }
}
