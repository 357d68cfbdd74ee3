use crate::config::settings::LoggingConfig;
use crate::ServiceConfig;

pub fn initiate_default_values(mut config: ServiceConfig) -> ServiceConfig {
    if config.settings.logging.is_none() {
        config.settings.logging = Some(LoggingConfig::default());
    }

    // temp files are renamed into the cache dir, keep them on the same filesystem
    let cache = &mut config.settings.cache;
    if cache.staging_dir.as_deref().map(str::trim).filter(|s| !s.is_empty()).is_none() {
        cache.staging_dir = Some(cache.dir.to_owned());
    }

    // trailing slashes would end up in log lines and metric labels
    trim_trailing_slash(&mut cache.dir);
    if let Some(staging_dir) = &mut cache.staging_dir {
        trim_trailing_slash(staging_dir);
    }

    config
}

fn trim_trailing_slash(path: &mut String) {
    while path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
}
