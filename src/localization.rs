use anyhow::{anyhow, Result};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::collections::HashMap;
use unic_langid::LanguageIdentifier;

/// Language used when the user's Telegram language is not supported
pub const DEFAULT_LANGUAGE: &str = "ru";

const RESOURCES: &[(&str, &str)] = &[
    ("ru", include_str!("../locales/ru/main.ftl")),
    ("en", include_str!("../locales/en/main.ftl")),
];

/// Localized user-facing messages
pub struct Localizer {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
}

impl std::fmt::Debug for Localizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Localizer")
            .field("languages", &self.bundles.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Localizer {
    /// Create a localizer with every bundled language loaded
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();

        for (language, source) in RESOURCES {
            let locale: LanguageIdentifier = language.parse()?;
            bundles.insert(language.to_string(), Self::create_bundle(locale, source)?);
        }

        Ok(Self { bundles })
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(
        locale: LanguageIdentifier,
        source: &str,
    ) -> Result<FluentBundle<FluentResource>> {
        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
        // Keeps Unicode isolation marks out of machine names and file paths
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow!("Invalid {locale} resource: {errors:?}"))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("Duplicate messages in {locale} resource: {errors:?}"))?;

        Ok(bundle)
    }

    /// Supported language matching a Telegram `language_code` like `en-US`
    pub fn resolve_language(&self, language_code: Option<&str>) -> &str {
        language_code
            .map(|code| code.split(['-', '_']).next().unwrap_or(code).to_lowercase())
            .and_then(|primary| {
                self.bundles
                    .get_key_value(primary.as_str())
                    .map(|(key, _)| key.as_str())
            })
            .unwrap_or(DEFAULT_LANGUAGE)
    }

    /// Get a localized message
    pub fn t_lang(&self, key: &str, language_code: Option<&str>) -> String {
        self.format(key, None, language_code)
    }

    /// Get a localized message with simple string arguments
    pub fn t_args_lang(
        &self,
        key: &str,
        args: &[(&str, &str)],
        language_code: Option<&str>,
    ) -> String {
        let mut fluent_args = FluentArgs::new();
        for (name, value) in args {
            fluent_args.set(*name, FluentValue::from(*value));
        }
        self.format(key, Some(&fluent_args), language_code)
    }

    fn format(&self, key: &str, args: Option<&FluentArgs>, language_code: Option<&str>) -> String {
        let language = self.resolve_language(language_code);
        let bundle = match self
            .bundles
            .get(language)
            .or_else(|| self.bundles.get(DEFAULT_LANGUAGE))
        {
            Some(bundle) => bundle,
            None => return format!("Missing translation: {key}"),
        };

        let pattern = match bundle.get_message(key).and_then(|msg| msg.value()) {
            Some(pattern) => pattern,
            None => return format!("Missing translation: {key}"),
        };

        let mut errors = Vec::new();
        bundle.format_pattern(pattern, args, &mut errors).into_owned()
    }
}
