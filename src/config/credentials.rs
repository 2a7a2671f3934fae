use super::schema::Config;

macro_rules! define_env_overrides {
    ($( $env:literal => $($path:ident).+ );* $(;)?) => {
        /// Env vars that can override a config field.
        pub const OVERRIDE_ENV_VARS: &[&str] = &[$($env),*];

        /// Apply overrides looked up through `lookup`.
        ///
        /// A variable that is set and non-empty replaces the corresponding
        /// field, so secrets can be injected without touching the config file.
        pub fn apply_overrides_from<F>(config: &mut Config, lookup: F)
        where
            F: Fn(&str) -> Option<String>,
        {
            $(
                if let Some(val) = lookup($env)
                    && !val.is_empty()
                {
                    config.$($path).+ = val;
                }
            )*
        }
    };
}

define_env_overrides! {
    "SMSBRIDGE_MATTERMOST_URL"   => mattermost.url;
    "SMSBRIDGE_MATTERMOST_TOKEN" => mattermost.token;
}
