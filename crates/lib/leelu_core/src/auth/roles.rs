//! Static role → capability table.
//!
//! Built once on first use and never mutated. A role's effective set is its
//! own list plus every capability whose inverted entry names the role.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use super::AuthError;
use crate::models::user::Role;

/// Capability names checked by the API routes.
pub mod capability {
    pub const VIEW_ALL_USERS: &str = "viewAllUsers";
    pub const BLOCK_USER: &str = "blockUser";
    pub const UNBLOCK_USER: &str = "unblockUser";
    pub const DELETE_USER: &str = "deleteUser";
    pub const PROMOTE_TO_ADMIN: &str = "promoteToAdmin";
    pub const REMOVE_ADMIN: &str = "removeAdmin";
    pub const INVITE_USER: &str = "inviteUser";
    pub const VIEW_PROFILE: &str = "viewProfile";
    pub const UPDATE_PROFILE: &str = "updateProfile";
}

/// Held by every role.
const PROFILE: &[&str] = &[capability::VIEW_PROFILE, capability::UPDATE_PROFILE];

const ACCOUNT_ADMIN: &[&str] = &[
    capability::VIEW_ALL_USERS,
    capability::BLOCK_USER,
    capability::UNBLOCK_USER,
    capability::DELETE_USER,
    capability::PROMOTE_TO_ADMIN,
    capability::REMOVE_ADMIN,
    capability::INVITE_USER,
];

const SUPER_ADMIN: &[&str] = &[
    // Doctors
    "registerDoctor",
    "updateDoctor",
    "deleteDoctor",
    "getDoctor",
    "getDoctors",
    "getDoctorDashboardStats",
    "getTodaysSchedule",
    // Managers
    "registerManager",
    "getManagersByDoctorId",
    "getManager",
    "getManagers",
    "updateManager",
    "deleteManager",
    // Patients
    "getPatients",
    "createPatient",
    "getPatient",
    "updatePatient",
    "deletePatient",
    // Appointments
    "createAppointment",
    "getAppointments",
    "getAppointment",
    "updateAppointment",
    "deleteAppointment",
    // Prescriptions
    "createPrescription",
    "getPrescriptions",
    "getPrescription",
    "getPrescriptionsByPatient",
    "getPrescriptionPDF",
    "updatePrescription",
    "finalizePrescription",
    "deletePrescription",
    // Doctor preferences
    "getDoctorPreferences",
    "updateDoctorPreferences",
    // Medical records
    "createMedicalRecord",
    "getMedicalRecord",
    "updateMedicalRecord",
    "deleteMedicalRecord",
    "getPatientHistory",
    "getDoctorRecords",
    "searchMedicalRecords",
    "addDiagnosis",
    "addMedication",
    "addLabResult",
    "markAsReviewed",
    "getMedicalRecordStats",
    "getRecentRecords",
    "getMyRecords",
    "getDashboardSummary",
    "getRecordVersionHistory",
    "exportPatientRecords",
    // Billing
    "createBill",
    "getBills",
    "getBillById",
    "updateBill",
    "deleteBill",
    "recordPayment",
    "getBillingStats",
    "getOverdueBills",
    "markOverdueBills",
];

const DOCTOR: &[&str] = &[
    "registerManager",
    "getManagersByDoctorId",
    "getManager",
    "updateManager",
    "deleteManager",
    "updateDoctor",
    "deleteDoctor",
    "getDoctor",
    "getDoctorDashboardStats",
    "getTodaysSchedule",
    "getPatients",
    "createPatient",
    "getPatient",
    "updatePatient",
    "deletePatient",
    "getAppointments",
    "getAppointment",
    "updateAppointment",
    "deleteAppointment",
    "createPrescription",
    "getPrescriptions",
    "getPrescription",
    "getPrescriptionsByPatient",
    "getPrescriptionPDF",
    "updatePrescription",
    "finalizePrescription",
    "deletePrescription",
    "getDoctorPreferences",
    "updateDoctorPreferences",
    "createBill",
    "getBills",
    "getBillById",
    "updateBill",
    "deleteBill",
    "recordPayment",
    "getBillingStats",
    "getOverdueBills",
];

const MANAGER: &[&str] = &[
    "getManager",
    "updateManager",
    "getPatients",
    "createPatient",
    "getPatient",
    "updatePatient",
    "deletePatient",
    "createAppointment",
    "getAppointments",
    "getAppointment",
    "updateAppointment",
    "deleteAppointment",
    "createPrescription",
    "getPrescriptions",
    "getPrescription",
    "getPrescriptionsByPatient",
    "getPrescriptionPDF",
    "getDoctorPreferences",
];

/// Capabilities granted by listing roles rather than by the role lists above.
const ACTION_ROLES: &[(&str, &[Role])] = &[
    ("createDryEyeTest", &[Role::Doctor, Role::Manager]),
    ("updateDryEyeTest", &[Role::Doctor, Role::Manager]),
    (
        "getDryEyeTest",
        &[Role::Doctor, Role::Manager, Role::SuperAdmin],
    ),
    ("deleteDryEyeTest", &[Role::Doctor, Role::SuperAdmin]),
    (
        "listDryEyeTests",
        &[Role::Doctor, Role::Manager, Role::SuperAdmin],
    ),
];

fn own_capabilities(role: Role) -> Vec<&'static str> {
    let specific: &[&[&'static str]] = match role {
        Role::User => &[],
        Role::Admin => &[ACCOUNT_ADMIN],
        Role::Doctor => &[DOCTOR],
        Role::Manager => &[MANAGER],
        Role::SuperAdmin => &[ACCOUNT_ADMIN, SUPER_ADMIN],
    };
    [&[PROFILE][..], specific].concat().concat()
}

static ROLE_TABLE: LazyLock<HashMap<Role, HashSet<&'static str>>> = LazyLock::new(|| {
    let mut table: HashMap<Role, HashSet<&'static str>> = Role::ALL
        .into_iter()
        .map(|role| (role, own_capabilities(role).into_iter().collect()))
        .collect();
    for (capability, roles) in ACTION_ROLES {
        for role in *roles {
            table.entry(*role).or_default().insert(*capability);
        }
    }
    table
});

static CAPABILITY_TABLE: LazyLock<HashMap<&'static str, Vec<Role>>> = LazyLock::new(|| {
    let mut table: HashMap<&'static str, Vec<Role>> = HashMap::new();
    for role in Role::ALL {
        for capability in permissions_for(role) {
            table.entry(*capability).or_default().push(role);
        }
    }
    table
});

static NO_CAPABILITIES: LazyLock<HashSet<&'static str>> = LazyLock::new(HashSet::new);

/// Effective capability set of a role.
pub fn permissions_for(role: Role) -> &'static HashSet<&'static str> {
    ROLE_TABLE.get(&role).unwrap_or(&NO_CAPABILITIES)
}

/// Capability set for a raw role name. Unknown names get the empty set.
pub fn permissions_for_name(role: &str) -> &'static HashSet<&'static str> {
    role.parse::<Role>()
        .map(permissions_for)
        .unwrap_or(&NO_CAPABILITIES)
}

/// Roles allowed to exercise `capability`, in declaration order.
pub fn roles_for(capability: &str) -> &'static [Role] {
    CAPABILITY_TABLE
        .get(capability)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

pub fn role_can(role: Role, capability: &str) -> bool {
    permissions_for(role).contains(capability)
}

/// True when the role's set is a superset of `required`.
pub fn role_has_all(role: Role, required: &[&str]) -> bool {
    let granted = permissions_for(role);
    required.iter().all(|c| granted.contains(c))
}

/// Fail with the first capability in `required` the role lacks.
pub fn ensure_capabilities(role: Role, required: &[&str]) -> Result<(), AuthError> {
    let granted = permissions_for(role);
    match required.iter().find(|c| !granted.contains(*c)) {
        Some(missing) => Err(AuthError::PermissionDenied((*missing).to_string())),
        None => Ok(()),
    }
}
