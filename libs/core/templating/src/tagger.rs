//! Profile tags for subjects and titles

use core_config::ActiveProfiles;

/// Prefix `subject` with every active profile unless running in production.
///
/// Profiles keep their declared order: `["staging", "qa"]` turns `Report`
/// into `[STAGING] [QA] Report`.
pub fn tag_subject(subject: &str, profiles: &ActiveProfiles) -> String {
    if profiles.is_production() {
        return subject.to_string();
    }

    let mut tagged = String::with_capacity(subject.len() + profiles.names().len() * 8);
    for profile in profiles.names() {
        tagged.push('[');
        tagged.push_str(&profile.to_uppercase());
        tagged.push_str("] ");
    }
    tagged.push_str(subject);
    tagged
}
