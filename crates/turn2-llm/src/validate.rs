use turn2_config::Turn2Config;
use turn2_error::Turn2Error;

/// Validate the provider's temperature/thinking-mode coupling before any
/// call is made (§4.5): when `temperature >= 1.0`, extended thinking MUST
/// be enabled. Returns a non-retryable [`turn2_error::ErrorKind::Validation`]
/// error with an actionable message on conflict.
pub fn validate_thinking_mode(config: &Turn2Config) -> Result<(), Turn2Error> {
    if config.thinking_mode_conflict() {
        return Err(Turn2Error::validation(format!(
            "temperature {} requires THINKING_TYPE=enabled, but THINKING_TYPE is disabled; \
             either lower TEMPERATURE below 1.0 or set THINKING_TYPE=enabled",
            config.temperature
        )));
    }
    Ok(())
}
