mod profiles;

pub use profiles::{
    icon_value, profile_name, register_profile, LauncherProfile, LauncherProfiles, PROFILES_FILE,
};
