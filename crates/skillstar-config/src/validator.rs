//! Configuration validation.

use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_browser(config, &mut result);
        Self::validate_platform(config, &mut result);
        Self::validate_layout(config, &mut result);
        Self::validate_dropdown(config, &mut result);

        result
    }

    fn validate_browser(config: &Config, result: &mut ValidationResult) {
        if config.browser.debug_port == 0 {
            result.add_error(ValidationError::new(
                "browser.debug_port",
                "Port cannot be 0",
            ));
        }

        if config.browser.request_timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "browser.request_timeout_secs",
                "request_timeout_secs must be greater than 0",
            ));
        }
    }

    fn validate_platform(config: &Config, result: &mut ValidationResult) {
        if let Err(e) = url::Url::parse(&config.platform.base_url) {
            result.add_error(ValidationError::new(
                "platform.base_url",
                format!("Invalid URL: {}", e),
            ));
        }

        if !config.platform.category_url_template.contains("{subject}") {
            result.add_warning(ValidationWarning::new(
                "platform.category_url_template",
                "Template has no {subject} placeholder; every subject maps to the same page",
            ));
        }
    }

    fn validate_layout(config: &Config, result: &mut ValidationResult) {
        for (name, selector) in config.layout.required_selectors() {
            if selector.trim().is_empty() {
                result.add_error(ValidationError::new(
                    format!("layout.{}", name),
                    "Selector cannot be empty",
                ));
            }
        }
    }

    fn validate_dropdown(config: &Config, result: &mut ValidationResult) {
        if config.dropdown.max_scroll_iterations == 0 {
            result.add_error(ValidationError::new(
                "dropdown.max_scroll_iterations",
                "max_scroll_iterations must be greater than 0",
            ));
        }

        if config.dropdown.scroll_increment_px == 0 {
            result.add_error(ValidationError::new(
                "dropdown.scroll_increment_px",
                "scroll_increment_px must be greater than 0",
            ));
        }

        if config.dropdown.open_wait_ms < 200 {
            result.add_warning(ValidationWarning::new(
                "dropdown.open_wait_ms",
                "open_wait_ms is very short (<200ms), menus on slow pages may be reported as timeouts",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
