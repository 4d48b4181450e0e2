use crate::{PermissionDenied, User};

pub fn check_authenticated(user: &User) -> bool {
    user.is_authenticated()
}

pub fn assert_authenticated(user: &User, message: Option<&str>) -> Result<(), PermissionDenied> {
    if !check_authenticated(user) {
        return Err(PermissionDenied::new(message));
    }

    Ok(())
}

pub fn check_superuser(user: &User) -> bool {
    check_authenticated(user) && user.is_superuser
}

pub fn assert_superuser(user: &User, message: Option<&str>) -> Result<(), PermissionDenied> {
    if !check_superuser(user) {
        return Err(PermissionDenied::new(message));
    }

    Ok(())
}

/// Checks global permissions of an authenticated user.
///
/// With `any_perm` a single held permission is enough, otherwise all are required. An
/// empty list passes only in the latter mode.
pub fn check_perms<P: AsRef<str>>(user: &User, perms: &[P], any_perm: bool, with_superuser: bool) -> bool {
    if !check_authenticated(user) {
        return false;
    }

    if with_superuser && check_superuser(user) {
        return true;
    }

    let held = |perm: &P| user.explicit_permissions().any(|held| held == perm.as_ref());

    if any_perm {
        perms.iter().any(held)
    } else {
        perms.iter().all(held)
    }
}

pub fn assert_perms<P: AsRef<str>>(
    user: &User,
    perms: &[P],
    any_perm: bool,
    with_superuser: bool,
    message: Option<&str>,
) -> Result<(), PermissionDenied> {
    if !check_perms(user, perms, any_perm, with_superuser) {
        return Err(PermissionDenied::new(message));
    }

    Ok(())
}
