//! SQLite schema definitions and SQL query constants.
//!
//! Pure data, no I/O. Dates are stored as `YYYY-MM-DD`, times as `HH:MM`,
//! timestamps as RFC 3339 and ids as UUID text.

/// SQL statement to create all tables.
pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS specializations (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE,
    description TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('patient', 'doctor', 'admin')),
    phone TEXT,
    gender TEXT,
    date_of_birth TEXT,
    address TEXT,
    bio TEXT,
    profile_image TEXT,
    specialization_id TEXT REFERENCES specializations(id),
    is_blocked INTEGER NOT NULL DEFAULT 0,
    is_deleted INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS doctor_applications (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id),
    specialization_id TEXT NOT NULL REFERENCES specializations(id),
    qualification TEXT NOT NULL,
    experience_years INTEGER NOT NULL,
    license_number TEXT NOT NULL,
    bio TEXT,
    document TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'approved', 'rejected')),
    review_note TEXT,
    created_at TEXT NOT NULL,
    reviewed_at TEXT
);

CREATE TABLE IF NOT EXISTS slots (
    id TEXT PRIMARY KEY,
    doctor_id TEXT NOT NULL REFERENCES users(id),
    slot_date TEXT NOT NULL,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS appointments (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES users(id),
    doctor_id TEXT NOT NULL REFERENCES users(id),
    slot_id TEXT NOT NULL REFERENCES slots(id) ON DELETE CASCADE,
    reason TEXT,
    status TEXT NOT NULL CHECK (status IN ('pending', 'confirmed', 'completed', 'canceled')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS medical_reports (
    id TEXT PRIMARY KEY,
    appointment_id TEXT NOT NULL UNIQUE REFERENCES appointments(id),
    patient_id TEXT NOT NULL REFERENCES users(id),
    doctor_id TEXT NOT NULL REFERENCES users(id),
    diagnosis TEXT NOT NULL,
    notes TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS medicines (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE
);

CREATE TABLE IF NOT EXISTS prescribed_medicines (
    id TEXT PRIMARY KEY,
    report_id TEXT NOT NULL REFERENCES medical_reports(id) ON DELETE CASCADE,
    medicine_id TEXT NOT NULL REFERENCES medicines(id),
    dosage TEXT NOT NULL,
    frequency TEXT NOT NULL,
    duration_days INTEGER NOT NULL,
    instructions TEXT,
    used_status TEXT NOT NULL DEFAULT 'ISSUED' CHECK (used_status IN ('ISSUED', 'USED')),
    used_at TEXT
);

CREATE TABLE IF NOT EXISTS ratings (
    id TEXT PRIMARY KEY,
    appointment_id TEXT NOT NULL UNIQUE REFERENCES appointments(id),
    patient_id TEXT NOT NULL REFERENCES users(id),
    doctor_id TEXT NOT NULL REFERENCES users(id),
    score INTEGER NOT NULL CHECK (score BETWEEN 1 AND 5),
    comment TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chats (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES users(id),
    doctor_id TEXT NOT NULL REFERENCES users(id),
    status TEXT NOT NULL CHECK (status IN ('pending', 'accepted', 'closed')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY,
    chat_id TEXT NOT NULL REFERENCES chats(id) ON DELETE CASCADE,
    sender_id TEXT NOT NULL REFERENCES users(id),
    body TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS contact_messages (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    subject TEXT NOT NULL,
    body TEXT NOT NULL,
    is_resolved INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

-- A slot is held by at most one appointment that is not canceled.
CREATE UNIQUE INDEX IF NOT EXISTS idx_appointments_active_slot
    ON appointments(slot_id) WHERE status <> 'canceled';
CREATE UNIQUE INDEX IF NOT EXISTS idx_applications_one_pending
    ON doctor_applications(user_id) WHERE status = 'pending';
CREATE UNIQUE INDEX IF NOT EXISTS idx_chats_open_pair
    ON chats(patient_id, doctor_id) WHERE status <> 'closed';

CREATE INDEX IF NOT EXISTS idx_users_role ON users(role);
CREATE INDEX IF NOT EXISTS idx_slots_doctor_date ON slots(doctor_id, slot_date);
CREATE INDEX IF NOT EXISTS idx_appointments_patient ON appointments(patient_id);
CREATE INDEX IF NOT EXISTS idx_appointments_doctor ON appointments(doctor_id);
CREATE INDEX IF NOT EXISTS idx_prescribed_report ON prescribed_medicines(report_id);
CREATE INDEX IF NOT EXISTS idx_ratings_doctor ON ratings(doctor_id);
CREATE INDEX IF NOT EXISTS idx_messages_chat ON messages(chat_id);
"#;

// User queries

pub const INSERT_USER: &str = r#"
INSERT INTO users (id, name, email, password_hash, role, phone, gender, date_of_birth,
                   address, bio, profile_image, specialization_id, is_blocked, is_deleted,
                   created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
"#;

pub const SELECT_USER_BY_ID: &str = r#"
SELECT id, name, email, password_hash, role, phone, gender, date_of_birth, address, bio,
       profile_image, specialization_id, is_blocked, is_deleted, created_at, updated_at
FROM users
WHERE id = ?1
"#;

pub const SELECT_USER_BY_EMAIL: &str = r#"
SELECT id, name, email, password_hash, role, phone, gender, date_of_birth, address, bio,
       profile_image, specialization_id, is_blocked, is_deleted, created_at, updated_at
FROM users
WHERE email = ?1
"#;

pub const SELECT_USERS: &str = r#"
SELECT id, name, email, password_hash, role, phone, gender, date_of_birth, address, bio,
       profile_image, specialization_id, is_blocked, is_deleted, created_at, updated_at
FROM users
WHERE is_deleted = 0 AND (?1 IS NULL OR role = ?1)
ORDER BY created_at DESC
"#;

pub const UPDATE_PROFILE: &str = r#"
UPDATE users
SET name = ?2, phone = ?3, gender = ?4, date_of_birth = ?5, address = ?6, bio = ?7,
    updated_at = ?8
WHERE id = ?1
"#;

pub const UPDATE_PROFILE_IMAGE: &str = r#"
UPDATE users SET profile_image = ?2, updated_at = ?3 WHERE id = ?1
"#;

pub const UPDATE_PASSWORD: &str = r#"
UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE id = ?1
"#;

pub const UPDATE_BLOCKED: &str = r#"
UPDATE users SET is_blocked = ?2, updated_at = ?3 WHERE id = ?1
"#;

pub const SOFT_DELETE_USER: &str = r#"
UPDATE users SET is_deleted = 1, updated_at = ?2 WHERE id = ?1
"#;

/// Active doctors with specialization name, rating total and rating count.
pub const SELECT_DOCTORS: &str = r#"
SELECT u.id, u.name, u.email, u.password_hash, u.role, u.phone, u.gender, u.date_of_birth,
       u.address, u.bio, u.profile_image, u.specialization_id, u.is_blocked, u.is_deleted,
       u.created_at, u.updated_at,
       s.name, COALESCE(SUM(r.score), 0), COUNT(r.id)
FROM users u
LEFT JOIN specializations s ON s.id = u.specialization_id
LEFT JOIN ratings r ON r.doctor_id = u.id
WHERE u.role = 'doctor' AND u.is_blocked = 0 AND u.is_deleted = 0
  AND (?1 IS NULL OR u.specialization_id = ?1)
GROUP BY u.id
ORDER BY u.name
"#;

pub const SELECT_DOCTOR_BY_ID: &str = r#"
SELECT u.id, u.name, u.email, u.password_hash, u.role, u.phone, u.gender, u.date_of_birth,
       u.address, u.bio, u.profile_image, u.specialization_id, u.is_blocked, u.is_deleted,
       u.created_at, u.updated_at,
       s.name, COALESCE(SUM(r.score), 0), COUNT(r.id)
FROM users u
LEFT JOIN specializations s ON s.id = u.specialization_id
LEFT JOIN ratings r ON r.doctor_id = u.id
WHERE u.id = ?1 AND u.role = 'doctor' AND u.is_blocked = 0 AND u.is_deleted = 0
GROUP BY u.id
"#;

// Specialization queries

pub const INSERT_SPECIALIZATION: &str = r#"
INSERT INTO specializations (id, name, description, created_at) VALUES (?1, ?2, ?3, ?4)
"#;

pub const SELECT_SPECIALIZATION_BY_ID: &str = r#"
SELECT id, name, description, created_at FROM specializations WHERE id = ?1
"#;

pub const SELECT_SPECIALIZATION_SUMMARIES: &str = r#"
SELECT s.id, s.name, s.description, s.created_at, COUNT(u.id)
FROM specializations s
LEFT JOIN users u ON u.specialization_id = s.id
    AND u.role = 'doctor' AND u.is_blocked = 0 AND u.is_deleted = 0
GROUP BY s.id
ORDER BY s.name
"#;

pub const UPDATE_SPECIALIZATION: &str = r#"
UPDATE specializations SET name = ?2, description = ?3 WHERE id = ?1
"#;

pub const COUNT_SPECIALIZATION_REFERENCES: &str = r#"
SELECT (SELECT COUNT(*) FROM users WHERE specialization_id = ?1)
     + (SELECT COUNT(*) FROM doctor_applications WHERE specialization_id = ?1)
"#;

pub const DELETE_SPECIALIZATION: &str = r#"
DELETE FROM specializations WHERE id = ?1
"#;

// Doctor application queries

pub const INSERT_APPLICATION: &str = r#"
INSERT INTO doctor_applications (id, user_id, specialization_id, qualification,
                                 experience_years, license_number, bio, document, status,
                                 review_note, created_at, reviewed_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
"#;

pub const COUNT_PENDING_APPLICATIONS_FOR_USER: &str = r#"
SELECT COUNT(*) FROM doctor_applications WHERE user_id = ?1 AND status = 'pending'
"#;

pub const SELECT_APPLICATION_BY_ID: &str = r#"
SELECT a.id, a.user_id, a.specialization_id, a.qualification, a.experience_years,
       a.license_number, a.bio, a.document, a.status, a.review_note, a.created_at,
       a.reviewed_at, u.name, u.email, s.name
FROM doctor_applications a
JOIN users u ON u.id = a.user_id
JOIN specializations s ON s.id = a.specialization_id
WHERE a.id = ?1
"#;

pub const SELECT_LATEST_APPLICATION_FOR_USER: &str = r#"
SELECT a.id, a.user_id, a.specialization_id, a.qualification, a.experience_years,
       a.license_number, a.bio, a.document, a.status, a.review_note, a.created_at,
       a.reviewed_at, u.name, u.email, s.name
FROM doctor_applications a
JOIN users u ON u.id = a.user_id
JOIN specializations s ON s.id = a.specialization_id
WHERE a.user_id = ?1
ORDER BY a.created_at DESC
LIMIT 1
"#;

pub const SELECT_APPLICATIONS: &str = r#"
SELECT a.id, a.user_id, a.specialization_id, a.qualification, a.experience_years,
       a.license_number, a.bio, a.document, a.status, a.review_note, a.created_at,
       a.reviewed_at, u.name, u.email, s.name
FROM doctor_applications a
JOIN users u ON u.id = a.user_id
JOIN specializations s ON s.id = a.specialization_id
WHERE (?1 IS NULL OR a.status = ?1)
ORDER BY a.created_at DESC
"#;

pub const DECIDE_APPLICATION: &str = r#"
UPDATE doctor_applications
SET status = ?2, review_note = ?3, reviewed_at = ?4
WHERE id = ?1 AND status = 'pending'
"#;

pub const PROMOTE_TO_DOCTOR: &str = r#"
UPDATE users
SET role = 'doctor', specialization_id = ?2, updated_at = ?3
WHERE id = ?1 AND role <> 'admin'
"#;

// Slot queries

pub const INSERT_SLOT: &str = r#"
INSERT INTO slots (id, doctor_id, slot_date, start_time, end_time, created_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
"#;

pub const SELECT_SLOT_BY_ID: &str = r#"
SELECT id, doctor_id, slot_date, start_time, end_time, created_at FROM slots WHERE id = ?1
"#;

pub const SELECT_DOCTOR_SLOTS_ON_DATE: &str = r#"
SELECT id, doctor_id, slot_date, start_time, end_time, created_at
FROM slots
WHERE doctor_id = ?1 AND slot_date = ?2
ORDER BY start_time
"#;

/// The doctor's slots from a date onward with a booked flag.
pub const SELECT_DOCTOR_SLOT_LISTINGS: &str = r#"
SELECT s.id, s.doctor_id, s.slot_date, s.start_time, s.end_time, s.created_at,
       a.id IS NOT NULL
FROM slots s
LEFT JOIN appointments a ON a.slot_id = s.id AND a.status <> 'canceled'
WHERE s.doctor_id = ?1 AND s.slot_date >= ?2
ORDER BY s.slot_date, s.start_time
"#;

/// Bookable slots: no non-canceled appointment and starting after `?2`
/// (formatted `YYYY-MM-DD HH:MM`).
pub const SELECT_AVAILABLE_SLOTS: &str = r#"
SELECT s.id, s.doctor_id, s.slot_date, s.start_time, s.end_time, s.created_at
FROM slots s
LEFT JOIN appointments a ON a.slot_id = s.id AND a.status <> 'canceled'
WHERE s.doctor_id = ?1
  AND a.id IS NULL
  AND (s.slot_date || ' ' || s.start_time) > ?2
ORDER BY s.slot_date, s.start_time
"#;

pub const COUNT_ACTIVE_APPOINTMENTS_FOR_SLOT: &str = r#"
SELECT COUNT(*) FROM appointments WHERE slot_id = ?1 AND status <> 'canceled'
"#;

pub const DELETE_SLOT: &str = r#"
DELETE FROM slots WHERE id = ?1 AND doctor_id = ?2
"#;

// Appointment queries

pub const INSERT_APPOINTMENT: &str = r#"
INSERT INTO appointments (id, patient_id, doctor_id, slot_id, reason, status, created_at,
                          updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
"#;

pub const SELECT_APPOINTMENT_BY_ID: &str = r#"
SELECT a.id, a.patient_id, a.doctor_id, a.slot_id, a.reason, a.status, a.created_at,
       a.updated_at, p.name, p.email, d.name, d.email, s.slot_date, s.start_time, s.end_time
FROM appointments a
JOIN users p ON p.id = a.patient_id
JOIN users d ON d.id = a.doctor_id
JOIN slots s ON s.id = a.slot_id
WHERE a.id = ?1
"#;

pub const SELECT_PATIENT_APPOINTMENTS: &str = r#"
SELECT a.id, a.patient_id, a.doctor_id, a.slot_id, a.reason, a.status, a.created_at,
       a.updated_at, p.name, p.email, d.name, d.email, s.slot_date, s.start_time, s.end_time
FROM appointments a
JOIN users p ON p.id = a.patient_id
JOIN users d ON d.id = a.doctor_id
JOIN slots s ON s.id = a.slot_id
WHERE a.patient_id = ?1
ORDER BY s.slot_date DESC, s.start_time DESC
"#;

pub const SELECT_DOCTOR_APPOINTMENTS: &str = r#"
SELECT a.id, a.patient_id, a.doctor_id, a.slot_id, a.reason, a.status, a.created_at,
       a.updated_at, p.name, p.email, d.name, d.email, s.slot_date, s.start_time, s.end_time
FROM appointments a
JOIN users p ON p.id = a.patient_id
JOIN users d ON d.id = a.doctor_id
JOIN slots s ON s.id = a.slot_id
WHERE a.doctor_id = ?1
ORDER BY s.slot_date DESC, s.start_time DESC
"#;

pub const SELECT_RECENT_APPOINTMENTS: &str = r#"
SELECT a.id, a.patient_id, a.doctor_id, a.slot_id, a.reason, a.status, a.created_at,
       a.updated_at, p.name, p.email, d.name, d.email, s.slot_date, s.start_time, s.end_time
FROM appointments a
JOIN users p ON p.id = a.patient_id
JOIN users d ON d.id = a.doctor_id
JOIN slots s ON s.id = a.slot_id
ORDER BY a.created_at DESC
LIMIT ?1
"#;

pub const SELECT_APPOINTMENT_PARTIES: &str = r#"
SELECT status, patient_id, doctor_id FROM appointments WHERE id = ?1
"#;

pub const TRANSITION_APPOINTMENT: &str = r#"
UPDATE appointments SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2
"#;

pub const APPOINTMENT_EXISTS: &str = r#"
SELECT COUNT(*) FROM appointments WHERE id = ?1
"#;

// Report and prescription queries

pub const INSERT_REPORT: &str = r#"
INSERT INTO medical_reports (id, appointment_id, patient_id, doctor_id, diagnosis, notes,
                             created_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#;

pub const COUNT_REPORTS_FOR_APPOINTMENT: &str = r#"
SELECT COUNT(*) FROM medical_reports WHERE appointment_id = ?1
"#;

pub const UPSERT_MEDICINE: &str = r#"
INSERT INTO medicines (id, name) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING
"#;

pub const SELECT_MEDICINE_ID: &str = r#"
SELECT id FROM medicines WHERE name = ?1
"#;

pub const INSERT_PRESCRIBED_MEDICINE: &str = r#"
INSERT INTO prescribed_medicines (id, report_id, medicine_id, dosage, frequency,
                                  duration_days, instructions, used_status, used_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'ISSUED', NULL)
"#;

pub const SELECT_REPORT_BY_ID: &str = r#"
SELECT r.id, r.appointment_id, r.patient_id, r.doctor_id, r.diagnosis, r.notes, r.created_at,
       p.name, d.name, s.slot_date
FROM medical_reports r
JOIN users p ON p.id = r.patient_id
JOIN users d ON d.id = r.doctor_id
JOIN appointments a ON a.id = r.appointment_id
JOIN slots s ON s.id = a.slot_id
WHERE r.id = ?1
"#;

pub const SELECT_REPORT_FOR_APPOINTMENT: &str = r#"
SELECT id, appointment_id, patient_id, doctor_id, diagnosis, notes, created_at
FROM medical_reports
WHERE appointment_id = ?1
"#;

pub const SELECT_PATIENT_REPORTS: &str = r#"
SELECT r.id, r.appointment_id, r.patient_id, r.doctor_id, r.diagnosis, r.notes, r.created_at,
       p.name, d.name, s.slot_date
FROM medical_reports r
JOIN users p ON p.id = r.patient_id
JOIN users d ON d.id = r.doctor_id
JOIN appointments a ON a.id = r.appointment_id
JOIN slots s ON s.id = a.slot_id
WHERE r.patient_id = ?1
ORDER BY r.created_at DESC
"#;

pub const SELECT_DOCTOR_REPORTS: &str = r#"
SELECT r.id, r.appointment_id, r.patient_id, r.doctor_id, r.diagnosis, r.notes, r.created_at,
       p.name, d.name, s.slot_date
FROM medical_reports r
JOIN users p ON p.id = r.patient_id
JOIN users d ON d.id = r.doctor_id
JOIN appointments a ON a.id = r.appointment_id
JOIN slots s ON s.id = a.slot_id
WHERE r.doctor_id = ?1
ORDER BY r.created_at DESC
"#;

pub const SELECT_REPORT_MEDICINES: &str = r#"
SELECT pm.id, pm.report_id, m.name, pm.dosage, pm.frequency, pm.duration_days,
       pm.instructions, pm.used_status, pm.used_at
FROM prescribed_medicines pm
JOIN medicines m ON m.id = pm.medicine_id
WHERE pm.report_id = ?1
ORDER BY pm.rowid
"#;

pub const SELECT_PRESCRIPTION_BY_ID: &str = r#"
SELECT pm.id, pm.report_id, m.name, pm.dosage, pm.frequency, pm.duration_days,
       pm.instructions, pm.used_status, pm.used_at,
       r.patient_id, p.name, d.name, r.diagnosis, r.created_at
FROM prescribed_medicines pm
JOIN medicines m ON m.id = pm.medicine_id
JOIN medical_reports r ON r.id = pm.report_id
JOIN users p ON p.id = r.patient_id
JOIN users d ON d.id = r.doctor_id
WHERE pm.id = ?1
"#;

/// The one-time flip. Zero affected rows means someone else got there first.
pub const REDEEM_PRESCRIPTION: &str = r#"
UPDATE prescribed_medicines
SET used_status = 'USED', used_at = ?2
WHERE id = ?1 AND used_status = 'ISSUED'
"#;

// Rating queries

pub const INSERT_RATING: &str = r#"
INSERT INTO ratings (id, appointment_id, patient_id, doctor_id, score, comment, created_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#;

pub const COUNT_RATINGS_FOR_APPOINTMENT: &str = r#"
SELECT COUNT(*) FROM ratings WHERE appointment_id = ?1
"#;

pub const SELECT_RATING_FOR_APPOINTMENT: &str = r#"
SELECT id, appointment_id, patient_id, doctor_id, score, comment, created_at
FROM ratings
WHERE appointment_id = ?1
"#;

pub const SELECT_DOCTOR_RATINGS: &str = r#"
SELECT r.id, r.appointment_id, r.patient_id, r.doctor_id, r.score, r.comment, r.created_at,
       p.name
FROM ratings r
JOIN users p ON p.id = r.patient_id
WHERE r.doctor_id = ?1
ORDER BY r.created_at DESC
"#;

pub const SELECT_DOCTOR_RATING_TOTALS: &str = r#"
SELECT COALESCE(SUM(score), 0), COUNT(*) FROM ratings WHERE doctor_id = ?1
"#;

// Chat queries

pub const SELECT_OPEN_CHAT_FOR_PAIR: &str = r#"
SELECT id, patient_id, doctor_id, status, created_at, updated_at
FROM chats
WHERE patient_id = ?1 AND doctor_id = ?2 AND status <> 'closed'
"#;

pub const INSERT_CHAT: &str = r#"
INSERT INTO chats (id, patient_id, doctor_id, status, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
"#;

pub const SELECT_CHAT_BY_ID: &str = r#"
SELECT c.id, c.patient_id, c.doctor_id, c.status, c.created_at, c.updated_at, p.name, d.name
FROM chats c
JOIN users p ON p.id = c.patient_id
JOIN users d ON d.id = c.doctor_id
WHERE c.id = ?1
"#;

pub const SELECT_USER_CHATS: &str = r#"
SELECT c.id, c.patient_id, c.doctor_id, c.status, c.created_at, c.updated_at, p.name, d.name
FROM chats c
JOIN users p ON p.id = c.patient_id
JOIN users d ON d.id = c.doctor_id
WHERE c.patient_id = ?1 OR c.doctor_id = ?1
ORDER BY c.updated_at DESC
"#;

pub const SELECT_CHAT_STATUS: &str = r#"
SELECT status FROM chats WHERE id = ?1
"#;

pub const TRANSITION_CHAT: &str = r#"
UPDATE chats SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2
"#;

pub const TOUCH_CHAT: &str = r#"
UPDATE chats SET updated_at = ?2 WHERE id = ?1
"#;

pub const INSERT_MESSAGE: &str = r#"
INSERT INTO messages (id, chat_id, sender_id, body, created_at) VALUES (?1, ?2, ?3, ?4, ?5)
"#;

pub const SELECT_CHAT_MESSAGES: &str = r#"
SELECT m.id, m.chat_id, m.sender_id, m.body, m.created_at, u.name
FROM messages m
JOIN users u ON u.id = m.sender_id
WHERE m.chat_id = ?1
ORDER BY m.created_at, m.rowid
"#;

// Contact queries

pub const INSERT_CONTACT_MESSAGE: &str = r#"
INSERT INTO contact_messages (id, name, email, subject, body, is_resolved, created_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#;

pub const SELECT_CONTACT_MESSAGES: &str = r#"
SELECT id, name, email, subject, body, is_resolved, created_at
FROM contact_messages
ORDER BY is_resolved ASC, created_at DESC
"#;

pub const RESOLVE_CONTACT_MESSAGE: &str = r#"
UPDATE contact_messages SET is_resolved = 1 WHERE id = ?1
"#;

// Admin queries

pub const SELECT_DASHBOARD_STATS: &str = r#"
SELECT
    (SELECT COUNT(*) FROM users WHERE role = 'patient' AND is_deleted = 0),
    (SELECT COUNT(*) FROM users WHERE role = 'doctor' AND is_deleted = 0),
    (SELECT COUNT(*) FROM appointments WHERE status = 'pending'),
    (SELECT COUNT(*) FROM appointments WHERE status = 'confirmed'),
    (SELECT COUNT(*) FROM appointments WHERE status = 'completed'),
    (SELECT COUNT(*) FROM appointments WHERE status = 'canceled'),
    (SELECT COUNT(*) FROM doctor_applications WHERE status = 'pending'),
    (SELECT COUNT(*) FROM contact_messages WHERE is_resolved = 0)
"#;
