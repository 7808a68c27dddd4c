use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mediverse_core::clinic::{
    AppointmentStatus, MedicalReport, MedicineInput, PrescriptionDetail, ReportDetail, UsedStatus,
};
use mediverse_core::storage::{RepositoryError, ReportRepository, Result};
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use super::super::conversions::{
    format_datetime, row_to_prescribed_medicine, row_to_prescription_detail, row_to_report,
    row_to_report_detail,
};
use super::super::error::{
    domain_err, map_tokio_rusqlite_error, map_tokio_rusqlite_error_with_id, wrap_err,
};
use super::super::schema;
use super::SqliteRepository;

/// Fills in the medicine lines of a report detail.
fn load_medicines(conn: &Connection, detail: &mut ReportDetail) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare(schema::SELECT_REPORT_MEDICINES)?;
    detail.medicines = stmt
        .query_map([detail.report.id.to_string()], row_to_prescribed_medicine)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(())
}

fn list_reports(conn: &Connection, sql: &str, user_id: &str) -> rusqlite::Result<Vec<ReportDetail>> {
    let mut stmt = conn.prepare(sql)?;
    let mut reports = stmt
        .query_map([user_id], row_to_report_detail)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    for report in &mut reports {
        load_medicines(conn, report)?;
    }
    Ok(reports)
}

#[async_trait]
impl ReportRepository for SqliteRepository {
    async fn create_report(&self, report: &MedicalReport, medicines: &[MedicineInput]) -> Result<()> {
        let report = report.clone();
        let medicines = medicines.to_vec();
        let appointment_id = report.appointment_id.to_string();

        self.conn
            .call(move |conn| {
                let tx = conn
                    .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)
                    .map_err(wrap_err)?;

                let (status, _patient_id, doctor_id): (String, String, String) = tx
                    .query_row(
                        schema::SELECT_APPOINTMENT_PARTIES,
                        [report.appointment_id.to_string()],
                        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                    )
                    .optional()
                    .map_err(wrap_err)?
                    .ok_or_else(|| {
                        domain_err(RepositoryError::not_found(
                            "Appointment",
                            report.appointment_id,
                        ))
                    })?;

                if doctor_id != report.doctor_id.to_string() {
                    return Err(domain_err(RepositoryError::not_found(
                        "Appointment",
                        report.appointment_id,
                    )));
                }
                if status != AppointmentStatus::Completed.as_str() {
                    return Err(domain_err(RepositoryError::conflict(
                        "Reports can only be written for completed appointments",
                    )));
                }

                let existing: i64 = tx
                    .query_row(
                        schema::COUNT_REPORTS_FOR_APPOINTMENT,
                        [report.appointment_id.to_string()],
                        |row| row.get(0),
                    )
                    .map_err(wrap_err)?;
                if existing > 0 {
                    return Err(domain_err(RepositoryError::conflict(
                        "A report was already written for this appointment",
                    )));
                }

                tx.execute(
                    schema::INSERT_REPORT,
                    rusqlite::params![
                        report.id.to_string(),
                        report.appointment_id.to_string(),
                        report.patient_id.to_string(),
                        report.doctor_id.to_string(),
                        report.diagnosis,
                        report.notes,
                        format_datetime(&report.created_at),
                    ],
                )
                .map_err(wrap_err)?;

                for medicine in &medicines {
                    tx.execute(
                        schema::UPSERT_MEDICINE,
                        [Uuid::new_v4().to_string(), medicine.name.clone()],
                    )
                    .map_err(wrap_err)?;
                    let medicine_id: String = tx
                        .query_row(schema::SELECT_MEDICINE_ID, [&medicine.name], |row| {
                            row.get(0)
                        })
                        .map_err(wrap_err)?;

                    tx.execute(
                        schema::INSERT_PRESCRIBED_MEDICINE,
                        rusqlite::params![
                            Uuid::new_v4().to_string(),
                            report.id.to_string(),
                            medicine_id,
                            medicine.dosage,
                            medicine.frequency,
                            medicine.duration_days,
                            medicine.instructions,
                        ],
                    )
                    .map_err(wrap_err)?;
                }

                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "MedicalReport", appointment_id))
    }

    async fn get_report(&self, id: Uuid) -> Result<Option<ReportDetail>> {
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let detail = conn
                    .query_row(schema::SELECT_REPORT_BY_ID, [&id_str], row_to_report_detail)
                    .optional()
                    .map_err(wrap_err)?;
                match detail {
                    Some(mut detail) => {
                        load_medicines(conn, &mut detail).map_err(wrap_err)?;
                        Ok(Some(detail))
                    }
                    None => Ok(None),
                }
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "MedicalReport", id.to_string()))
    }

    async fn report_for_appointment(&self, appointment_id: Uuid) -> Result<Option<MedicalReport>> {
        let appointment_id = appointment_id.to_string();

        self.conn
            .call(move |conn| {
                conn.query_row(
                    schema::SELECT_REPORT_FOR_APPOINTMENT,
                    [&appointment_id],
                    row_to_report,
                )
                .optional()
                .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "MedicalReport"))
    }

    async fn list_patient_reports(&self, patient_id: Uuid) -> Result<Vec<ReportDetail>> {
        let patient_id = patient_id.to_string();

        self.conn
            .call(move |conn| {
                list_reports(conn, schema::SELECT_PATIENT_REPORTS, &patient_id).map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "MedicalReport"))
    }

    async fn list_doctor_reports(&self, doctor_id: Uuid) -> Result<Vec<ReportDetail>> {
        let doctor_id = doctor_id.to_string();

        self.conn
            .call(move |conn| {
                list_reports(conn, schema::SELECT_DOCTOR_REPORTS, &doctor_id).map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, "MedicalReport"))
    }

    async fn get_prescription(&self, medicine_id: Uuid) -> Result<Option<PrescriptionDetail>> {
        let id_str = medicine_id.to_string();

        self.conn
            .call(move |conn| {
                conn.query_row(
                    schema::SELECT_PRESCRIPTION_BY_ID,
                    [&id_str],
                    row_to_prescription_detail,
                )
                .optional()
                .map_err(wrap_err)
            })
            .await
            .map_err(|e| {
                map_tokio_rusqlite_error_with_id(e, "Prescription", medicine_id.to_string())
            })
    }

    async fn redeem_prescription(
        &self,
        medicine_id: Uuid,
        patient_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<PrescriptionDetail> {
        let id_str = medicine_id.to_string();
        let used_at = format_datetime(&now);

        self.conn
            .call(move |conn| {
                // IMMEDIATE holds the write lock from the read to the flip.
                let tx = conn
                    .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)
                    .map_err(wrap_err)?;

                let mut detail = tx
                    .query_row(
                        schema::SELECT_PRESCRIPTION_BY_ID,
                        [&id_str],
                        row_to_prescription_detail,
                    )
                    .optional()
                    .map_err(wrap_err)?
                    .filter(|detail| detail.patient_id == patient_id)
                    .ok_or_else(|| {
                        domain_err(RepositoryError::not_found("Prescription", &id_str))
                    })?;

                let rows = tx
                    .execute(schema::REDEEM_PRESCRIPTION, [&id_str, &used_at])
                    .map_err(wrap_err)?;
                if rows == 0 {
                    // Dropping the transaction rolls it back.
                    return Err(domain_err(RepositoryError::conflict(
                        "This prescription has already been used",
                    )));
                }

                tx.commit().map_err(wrap_err)?;
                detail.medicine.used_status = UsedStatus::Used;
                detail.medicine.used_at = Some(now);
                Ok(detail)
            })
            .await
            .map_err(|e| {
                map_tokio_rusqlite_error_with_id(e, "Prescription", medicine_id.to_string())
            })
    }
}
