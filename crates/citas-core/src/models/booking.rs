// Records are kept as raw JSON objects; accessors cover what the CLI shows.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn str_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Service(pub Map<String, Value>);

impl Service {
    pub fn id(&self) -> Option<i64> {
        self.0.get("id").and_then(Value::as_i64)
    }

    pub fn name(&self) -> Option<&str> {
        str_field(&self.0, "nombre")
    }

    pub fn description(&self) -> Option<&str> {
        str_field(&self.0, "descripcion")
    }

    /// Duration as the backend writes it, e.g. "30 min" or "1 hora"
    pub fn duration(&self) -> Option<&str> {
        str_field(&self.0, "duracion")
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Professional(pub Map<String, Value>);

impl Professional {
    pub fn id(&self) -> Option<i64> {
        self.0.get("id").and_then(Value::as_i64)
    }

    /// Full listings carry `nombreUsuario`, simplified ones `nombre`
    pub fn name(&self) -> Option<&str> {
        str_field(&self.0, "nombreUsuario").or_else(|| str_field(&self.0, "nombre"))
    }

    pub fn specialty(&self) -> Option<&str> {
        str_field(&self.0, "especialidad")
    }

    pub fn rating(&self) -> Option<f64> {
        self.0.get("calificacionPromedio").and_then(Value::as_f64)
    }

    pub fn display_rating(&self) -> String {
        match self.rating() {
            Some(rating) => format!("{:.1} ★", rating),
            None => "Sin calificación".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Appointment(pub Map<String, Value>);

impl Appointment {
    pub fn id(&self) -> Option<i64> {
        self.0.get("id").and_then(Value::as_i64)
    }

    /// Scheduled time as sent by the server (local, no offset)
    pub fn scheduled_at(&self) -> Option<&str> {
        str_field(&self.0, "fechaHora")
    }

    pub fn status(&self) -> Option<&str> {
        str_field(&self.0, "estado")
    }

    pub fn service_name(&self) -> Option<&str> {
        str_field(&self.0, "nombreServicio")
    }

    pub fn professional_name(&self) -> Option<&str> {
        str_field(&self.0, "nombreProfesional")
    }

    pub fn final_price(&self) -> Option<f64> {
        self.0.get("precioFinal").and_then(Value::as_f64)
    }

    pub fn notes(&self) -> Option<&str> {
        str_field(&self.0, "notas")
    }
}

/// Payload for `POST /citas`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    #[serde(with = "local_datetime")]
    pub fecha_hora: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notas: Option<String>,
    pub usuario_id: i64,
    pub servicio_id: i64,
    pub profesional_id: i64,
}

/// The backend expects `yyyy-MM-ddTHH:mm:ss` without an offset.
mod local_datetime {
    use chrono::NaiveDateTime;
    use serde::Serializer;

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.format(FORMAT).to_string())
    }
}
