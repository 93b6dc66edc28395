use thiserror::Error;
use vidmap_core::{CoreError, FeatureKind, RestrictionReason};
use vidmap_geocode::GeocodeError;
use vidmap_youtube::VideoError;

/// Errors surfaced by the orchestrator.
///
/// Provider transport failures are folded into [`SearchError::Provider`]
/// so callers never see `reqwest` or JSON errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error("coordinate out of range: lat={latitude}, lng={longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("search text is empty")]
    EmptyQuery,

    #[error("no place found for {query:?}")]
    NotFound { query: String },

    #[error("unsupported place {name:?} (kind: {kind})")]
    InvalidFeatureKind { kind: FeatureKind, name: String },

    #[error("search restricted ({reason:?}): {message}")]
    Restricted {
        reason: RestrictionReason,
        message: String,
    },

    /// The video provider rejected this request for quota reasons.
    #[error("video quota exceeded: {0}")]
    QuotaExceeded(String),

    /// A previous request exhausted the quota; searches stay disabled.
    #[error("video searches are disabled after a quota error")]
    QuotaBlocked,

    #[error("video provider unavailable")]
    ProviderUnavailable,

    #[error("no active location: click the map or share your location first")]
    NoActiveLocation,

    #[error("provider error: {0}")]
    Provider(String),
}

impl SearchError {
    /// Text shown to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCoordinate { .. } => "Coordenadas fuera de rango.".to_string(),
            Self::EmptyQuery => "Escribe algo para buscar.".to_string(),
            Self::NotFound { .. } => {
                "No encontramos ese lugar. Prueba con otro nombre.".to_string()
            }
            Self::InvalidFeatureKind { .. } => "ubicación no disponible".to_string(),
            Self::Restricted { message, .. } => message.clone(),
            Self::QuotaExceeded(_) | Self::QuotaBlocked => {
                "Se agotó la cuota de búsquedas de video en esta región. Inténtalo más tarde."
                    .to_string()
            }
            Self::ProviderUnavailable => {
                "El servicio de videos no está disponible en este momento.".to_string()
            }
            Self::NoActiveLocation => {
                "Selecciona una ubicación en el mapa o comparte tu ubicación.".to_string()
            }
            Self::Provider(_) => "No se pudo completar la búsqueda. Inténtalo de nuevo.".to_string(),
        }
    }

    /// `true` for errors after which further video searches are pointless.
    #[must_use]
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::QuotaExceeded(_) | Self::QuotaBlocked)
    }
}

impl From<CoreError> for SearchError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidCoordinate {
                latitude,
                longitude,
            } => Self::InvalidCoordinate {
                latitude,
                longitude,
            },
            CoreError::UnknownCategory(_) => Self::Provider(err.to_string()),
        }
    }
}

impl From<GeocodeError> for SearchError {
    fn from(err: GeocodeError) -> Self {
        match err {
            GeocodeError::NotFound { query } => Self::NotFound { query },
            GeocodeError::InvalidFeatureKind { kind, name } => {
                Self::InvalidFeatureKind { kind, name }
            }
            other => Self::Provider(other.to_string()),
        }
    }
}

impl From<VideoError> for SearchError {
    fn from(err: VideoError) -> Self {
        match err {
            VideoError::QuotaExceeded(reason) => Self::QuotaExceeded(reason),
            other => Self::Provider(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_feature_kind_reads_ubicacion_no_disponible() {
        let err = SearchError::from(GeocodeError::InvalidFeatureKind {
            kind: FeatureKind::Unknown,
            name: String::new(),
        });
        assert_eq!(err.user_message(), "ubicación no disponible");
    }

    #[test]
    fn quota_errors_are_distinguished_from_transport_errors() {
        let quota = SearchError::from(VideoError::QuotaExceeded("quotaExceeded".into()));
        assert!(quota.is_quota());

        let transport = SearchError::from(VideoError::UnexpectedStatus { status: 500 });
        assert!(matches!(transport, SearchError::Provider(_)));
        assert!(!transport.is_quota());
    }

    #[test]
    fn restricted_message_is_passed_through() {
        let err = SearchError::Restricted {
            reason: RestrictionReason::Country,
            message: RestrictionReason::Country.message().to_string(),
        };
        assert_eq!(err.user_message(), RestrictionReason::Country.message());
    }
}
