// 📚 Reference Taxonomy - Fixed vocabulary of process codes
//
// "tab.abono", "TAB.ABONO", "Tab.Abono" → all the same code, rendered with
// the casing stored here. The table is immutable once built; changing the
// vocabulary is a deployment concern (new defaults or a new config file).

use anyhow::{Context, Result};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::warn;

// ============================================================================
// DEFAULT VOCABULARY
// ============================================================================

/// Built-in tabulación codes, in display order.
///
/// Some historical entries keep their upper-case spelling; lookups are
/// case-insensitive and always answer with the casing below.
pub const DEFAULT_CODES: &[&str] = &[
    // Pagos y abonos
    "tab.abono",
    "tab.abono.parcial",
    "tab.abono.total",
    "tab.pago",
    "tab.pago.rechazado",
    "tab.pago.duplicado",
    "tab.pago.noaplicado",
    "tab.pac",
    "tab.pat",
    "tab.compromisopago",
    "tab.convenio",
    "tab.convenio.pago",
    "tab.reembolso",
    "tab.notacredito",
    // Facturación
    "tab.facturacion",
    "tab.facturacion.error",
    "tab.facturacion.electronica",
    "tab.ajuste",
    "tab.ajuste.factura",
    "tab.ajuste.cargo",
    "tab.duplicado",
    "tab.duplicado.factura",
    "tab.descuento",
    "tab.descuento.fidelizacion",
    "TAB.Reclamo.Facturacion",
    // Cobranza
    "tab.cobranza",
    "tab.cobranza.preventiva",
    "tab.cobranza.judicial",
    "tab.mora",
    "tab.suspension",
    "tab.suspension.temporal",
    "tab.reconexion",
    // Portabilidad
    "tab.portabilidad",
    "tab.portabilidad.entrante",
    "tab.portabilidad.saliente",
    "tab.portacancelada",
    "tab.portarechazada",
    "tab.PortaEntrante",
    "tab.bajaportabilidad",
    // Altas, bajas y cambios
    "tab.activacion",
    "tab.activacion.linea",
    "tab.activacion.servicio",
    "tab.altanueva",
    "tab.alta.hogar",
    "tab.alta.movil",
    "tab.baja",
    "tab.baja.voluntaria",
    "tab.baja.morosidad",
    "tab.bloqueo",
    "tab.bloqueo.robo",
    "tab.bloqueo.perdida",
    "tab.cambioplan",
    "tab.cambioplan.upgrade",
    "tab.cambioplan.downgrade",
    "tab.cambiotitular",
    "tab.cambiodomicilio",
    "tab.cambiosim",
    "tab.contrato",
    "tab.contrato.renovacion",
    "tab.traslado",
    "tab.traslado.servicio",
    "tab.migracion",
    "tab.migracion.ftth",
    "tab.migracion.tecnologia",
    // Retención y ventas
    "tab.fidelizacion",
    "tab.fidelizacion.retencion",
    "tab.retencion",
    "tab.promocion",
    "tab.promocion.aplicacion",
    "tab.venta",
    "tab.venta.equipo",
    "tab.venta.adicional",
    "tab.recarga",
    "tab.recarga.fallida",
    "tab.roaming",
    "tab.roaming.activacion",
    "tab.roaming.cobro",
    // Consultas y reclamos
    "tab.consulta",
    "tab.consulta.saldo",
    "tab.consulta.factura",
    "tab.consulta.plan",
    "tab.reclamo",
    "tab.reclamo.cobro",
    "tab.reclamo.servicio",
    "tab.reclamo.sernac",
    "tab.escalamiento",
    "tab.escalamiento.supervisor",
    "TAB.CallBack",
    "tab.SAC",
    "tab.SAC.Derivacion",
    // Soporte técnico
    "tab.soporte",
    "tab.soporte.internet",
    "tab.soporte.telefonia",
    "tab.soporte.television",
    "tab.soporte.wifi",
    "tab.soportefanftth",
    "tab.soportehfc",
    "tab.soportemovil",
    "tab.internet.lento",
    "tab.internet.caido",
    "tab.telefonia.sinlinea",
    "tab.television.sinsenal",
    "tab.correo",
    "tab.clave.reseteo",
    "tab.app.acceso",
    "tab.web.acceso",
    // Terreno e instalaciones
    "tab.instalacion",
    "tab.instalacion.ftth",
    "tab.instalacion.hfc",
    "tab.instalacion.reagenda",
    "tab.visita.tecnica",
    "tab.visita.reagenda",
    "tab.visita.cancelada",
    // Equipos
    "tab.equipo",
    "tab.equipo.garantia",
    "tab.equipo.reparacion",
    "tab.equipo.reemplazo",
    "tab.garantia",
    "tab.devolucion",
    "tab.devolucion.equipo",
    "tab.devolucion.dinero",
    // Validaciones
    "tab.verificacion",
    "tab.verificacion.identidad",
    "tab.validacion",
];

// ============================================================================
// CANONICAL CODE
// ============================================================================

/// A member of the reference vocabulary, in its official casing.
///
/// Only [`ReferenceTaxonomy`] hands these out, so holding one means the code
/// was matched against the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalCode(String);

impl CanonicalCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Dot-separated segments, namespace first ("tab", "abono", "parcial")
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Number of segments below the namespace
    pub fn depth(&self) -> usize {
        self.segments().count().saturating_sub(1)
    }
}

impl fmt::Display for CanonicalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for CanonicalCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

// ============================================================================
// REFERENCE TAXONOMY
// ============================================================================

/// Immutable, ordered set of canonical codes with case-insensitive lookup.
#[derive(Debug, Clone)]
pub struct ReferenceTaxonomy {
    /// Codes in declaration order
    codes: Vec<CanonicalCode>,

    /// lower-cased code → position in `codes`
    index: HashMap<String, usize>,
}

impl ReferenceTaxonomy {
    /// Taxonomy with the built-in vocabulary
    pub fn with_defaults() -> Self {
        Self::from_codes(DEFAULT_CODES.iter().copied())
    }

    /// Build from any list of codes.
    ///
    /// Entries that collide case-insensitively are collapsed; the first
    /// spelling wins. Blank entries are skipped.
    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut taxonomy = ReferenceTaxonomy {
            codes: Vec::new(),
            index: HashMap::new(),
        };

        for code in codes {
            let code = code.as_ref().trim();
            if code.is_empty() {
                continue;
            }

            let key = code.to_lowercase();
            if let Some(&existing) = taxonomy.index.get(&key) {
                warn!(
                    code,
                    kept = taxonomy.codes[existing].as_str(),
                    "duplicate taxonomy entry ignored"
                );
                continue;
            }

            taxonomy.index.insert(key, taxonomy.codes.len());
            taxonomy.codes.push(CanonicalCode(code.to_string()));
        }

        taxonomy
    }

    /// Load a taxonomy from a JSON array of strings
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read taxonomy file: {:?}", path.as_ref()))?;

        let codes: Vec<String> =
            serde_json::from_str(&content).context("Failed to parse taxonomy JSON")?;

        Ok(Self::from_codes(codes))
    }

    /// Case-insensitive lookup; answers with the taxonomy's own casing
    pub fn lookup(&self, code: &str) -> Option<&CanonicalCode> {
        self.index
            .get(&code.trim().to_lowercase())
            .map(|&position| &self.codes[position])
    }

    pub fn contains(&self, code: &str) -> bool {
        self.lookup(code).is_some()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CanonicalCode> {
        self.codes.iter()
    }
}

impl Default for ReferenceTaxonomy {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// TESTS
// ============================================================================
