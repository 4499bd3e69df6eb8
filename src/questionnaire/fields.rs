use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Questionnaire forms handled by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FormKind {
    #[serde(rename = "estacoes_moveis")]
    MobileStations,
    #[serde(rename = "trafego_originado")]
    OriginatedTraffic,
}

impl FormKind {
    pub const fn ordered() -> [Self; 2] {
        [Self::MobileStations, Self::OriginatedTraffic]
    }

    /// Identifier used by the form-rendering layer.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MobileStations => "estacoes_moveis",
            Self::OriginatedTraffic => "trafego_originado",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::MobileStations => "Mobile Stations",
            Self::OriginatedTraffic => "Originated Traffic",
        }
    }

    /// Key under which drafts of this form are persisted.
    pub fn draft_key(self) -> String {
        format!("{}_draft", self.as_str())
    }

    pub fn fields(self) -> impl Iterator<Item = FieldName> {
        FieldName::ALL
            .iter()
            .copied()
            .filter(move |field| field.belongs_to(self))
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown questionnaire form '{0}'")]
pub struct UnknownForm(pub String);

impl FromStr for FormKind {
    type Err = UnknownForm;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "estacoes_moveis" | "mobile_stations" => Ok(Self::MobileStations),
            "trafego_originado" | "originated_traffic" => Ok(Self::OriginatedTraffic),
            _ => Err(UnknownForm(value.to_string())),
        }
    }
}

/// How the raw string of a field is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Whole counts; separators are stripped before parsing.
    Integer,
    /// Currency amounts with at most two decimals, stored as cents.
    Fractional,
    Text,
}

impl FieldKind {
    pub const fn is_numeric(self) -> bool {
        !matches!(self, Self::Text)
    }
}

/// Sections of a questionnaire. Live re-validation is scoped to a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldGroup {
    Period,
    MobileMoney,
    Broadband,
    Plans,
    LeasedLines,
    Services,
    Data,
    Sms,
    Voice,
    Calls,
    OtherTraffic,
}

impl FieldGroup {
    /// `None` for groups shared by every form.
    pub const fn form(self) -> Option<FormKind> {
        match self {
            Self::Period => None,
            Self::MobileMoney
            | Self::Broadband
            | Self::Plans
            | Self::LeasedLines
            | Self::Services => Some(FormKind::MobileStations),
            Self::Data | Self::Sms | Self::Voice | Self::Calls | Self::OtherTraffic => {
                Some(FormKind::OriginatedTraffic)
            }
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Period => "Reporting period",
            Self::MobileMoney => "Mobile Money",
            Self::Broadband => "Mobile broadband",
            Self::Plans => "Subscription plans",
            Self::LeasedLines => "Leased lines",
            Self::Services => "Value-added services",
            Self::Data => "Data traffic",
            Self::Sms => "SMS",
            Self::Voice => "Voice",
            Self::Calls => "Calls",
            Self::OtherTraffic => "Other traffic",
        }
    }
}

macro_rules! field_names {
    ($($variant:ident => $wire:literal, $kind:ident, $group:ident;)+) => {
        /// Every questionnaire input known to the engine.
        ///
        /// Variants serialize to the input names used by the form-rendering layer.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum FieldName {
            $($variant,)+
        }

        impl FieldName {
            pub const ALL: &'static [FieldName] = &[$(FieldName::$variant,)+];

            pub const fn as_str(self) -> &'static str {
                match self {
                    $(FieldName::$variant => $wire,)+
                }
            }

            pub const fn kind(self) -> FieldKind {
                match self {
                    $(FieldName::$variant => FieldKind::$kind,)+
                }
            }

            pub const fn group(self) -> FieldGroup {
                match self {
                    $(FieldName::$variant => FieldGroup::$group,)+
                }
            }
        }
    };
}

field_names! {
    Year => "ano", Text, Period;
    Month => "mes", Text, Period;
    Operator => "operadora", Text, Period;

    MobileMoneyUsers => "numero_utilizadores", Integer, MobileMoney;
    MobileMoneyUsersFemale => "numero_utilizadores_mulher", Integer, MobileMoney;
    MobileMoneyUsersMale => "numero_utilizadores_homem", Integer, MobileMoney;
    TopUpsTotal => "total_carregamentos", Fractional, MobileMoney;
    TopUpsFemale => "total_carregamentos_mulher", Fractional, MobileMoney;
    TopUpsMale => "total_carregamentos_homem", Fractional, MobileMoney;
    WithdrawalsTotal => "total_levantamentos", Fractional, MobileMoney;
    WithdrawalsFemale => "total_levantamentos_mulher", Fractional, MobileMoney;
    WithdrawalsMale => "total_levantamentos_homem", Fractional, MobileMoney;
    TransfersTotal => "total_transferencias", Fractional, MobileMoney;
    TransfersFemale => "total_transferencias_mulher", Fractional, MobileMoney;
    TransfersMale => "total_transferencias_homem", Fractional, MobileMoney;

    Service3gUpgradeUsers => "utilizadores_servico_3g_upgrades", Integer, Broadband;
    Internet3gUsers => "utilizadores_acesso_internet_3g", Integer, Broadband;
    Box3gUsers => "utilizadores_3g_placas_box", Integer, Broadband;
    Usb3gUsers => "utilizadores_3g_placas_usb", Integer, Broadband;
    Service4gUsers => "utilizadores_servico_4g", Integer, Broadband;
    Internet4gUsers => "utilizadores_acesso_internet_4g", Integer, Broadband;
    Box4gUsers => "utilizadores_4g_placas_box", Integer, Broadband;
    Usb4gUsers => "utilizadores_4g_placas_usb", Integer, Broadband;

    PostpaidPlanStations => "afectos_planos_pos_pagos", Integer, Plans;
    PostpaidActiveStations => "afectos_planos_pos_pagos_utilizacao", Integer, Plans;
    PrepaidPlanStations => "afectos_planos_pre_pagos", Integer, Plans;
    PrepaidActiveStations => "afectos_planos_pre_pagos_utilizacao", Integer, Plans;
    SpecificSituationStations => "associados_situacoes_especificas", Integer, Plans;
    ResidualStations => "outros_residuais", Integer, Plans;

    LeasedLines64k => "linhas_64kbit", Integer, LeasedLines;
    LeasedLines128k => "linhas_128kbit", Integer, LeasedLines;
    LeasedLines256k => "linhas_256kbit", Integer, LeasedLines;
    LeasedLines512k => "linhas_512kbit", Integer, LeasedLines;
    LeasedLines1m => "linhas_1mbit", Integer, LeasedLines;
    LeasedLinesAbove2m => "linhas_maior_2mbit", Integer, LeasedLines;

    SmsStations => "sms", Integer, Services;
    MmsStations => "mms", Integer, Services;
    MobileTvStations => "mobile_tv", Integer, Services;
    OutboundRoamingStations => "roaming_internacional_out_parc_roaming_out", Integer, Services;

    Data2gMegabytes => "trafego_dados_2g_mbytes", Integer, Data;
    Data2gSessions => "trafego_dados_2g_sessoes", Integer, Data;
    Data3gUpgradeMegabytes => "trafego_dados_3g_upgrade_mbytes", Integer, Data;
    Data3gUpgradeSessions => "trafego_dados_3g_upgrade_sessoes", Integer, Data;
    Internet3gMegabytes => "internet_3g_mbytes", Integer, Data;
    Internet3gSessions => "internet_3g_sessoes", Integer, Data;
    Internet3gModemMegabytes => "internet_3g_placas_modem_mbytes", Integer, Data;
    Internet3gModemSessions => "internet_3g_placas_modem_sessoes", Integer, Data;
    Internet3gUsbMegabytes => "internet_3g_modem_usb_mbytes", Integer, Data;
    Internet3gUsbSessions => "internet_3g_modem_usb_sessoes", Integer, Data;
    Data4gMegabytes => "trafego_dados_4g_mbytes", Integer, Data;
    Data4gSessions => "trafego_dados_4g_sessoes", Integer, Data;
    Internet4gMegabytes => "internet_4g_mbytes", Integer, Data;
    Internet4gSessions => "internet_4g_sessoes", Integer, Data;
    Internet4gModemMegabytes => "internet_4g_placas_modem_mbytes", Integer, Data;
    Internet4gModemSessions => "internet_4g_placas_modem_sessoes", Integer, Data;
    Internet4gUsbMegabytes => "internet_4g_modem_usb_mbytes", Integer, Data;
    Internet4gUsbSessions => "internet_4g_modem_usb_sessoes", Integer, Data;

    SmsOnNet => "sms_on_net", Integer, Sms;
    SmsOffNetNational => "sms_off_net_nacional", Integer, Sms;
    SmsEcowas => "sms_cedeao", Integer, Sms;
    SmsPalop => "sms_palop", Integer, Sms;
    SmsCplp => "sms_cplp", Integer, Sms;
    SmsRestOfAfrica => "sms_resto_africa", Integer, Sms;
    SmsRestOfWorld => "sms_resto_mundo", Integer, Sms;
    SmsInternationalTotal => "sms_internacional_total", Integer, Sms;
    SmsTotal => "sms_total", Integer, Sms;

    VoiceOnNetMinutes => "voz_on_net_minutos", Integer, Voice;
    VoiceOffNetNationalMinutes => "voz_off_net_nacional_minutos", Integer, Voice;
    VoiceFixedNetworkMinutes => "voz_rede_fixa_minutos", Integer, Voice;
    VoiceOtherMobileMinutes => "voz_outras_redes_moveis_minutos", Integer, Voice;
    VoiceEcowasMinutes => "voz_cedeao_minutos", Integer, Voice;
    VoicePalopMinutes => "voz_palop_minutos", Integer, Voice;
    VoiceCplpMinutes => "voz_cplp_minutos", Integer, Voice;
    VoiceRestOfAfricaMinutes => "voz_resto_africa_minutos", Integer, Voice;
    VoiceRestOfWorldMinutes => "voz_resto_mundo_minutos", Integer, Voice;
    VoiceInternationalTotalMinutes => "voz_internacional_total_minutos", Integer, Voice;
    VoiceTotalMinutes => "voz_total_minutos", Integer, Voice;

    CallsOnNet => "chamadas_on_net", Integer, Calls;
    CallsOffNetNational => "chamadas_off_net_nacional", Integer, Calls;
    CallsFixedNetwork => "chamadas_rede_fixa", Integer, Calls;
    CallsOtherMobile => "chamadas_outras_redes_moveis", Integer, Calls;
    CallsEcowas => "chamadas_cedeao", Integer, Calls;
    CallsPalop => "chamadas_palop", Integer, Calls;
    CallsCplp => "chamadas_cplp", Integer, Calls;
    CallsRestOfAfrica => "chamadas_resto_africa", Integer, Calls;
    CallsRestOfWorld => "chamadas_resto_mundo", Integer, Calls;
    CallsInternationalTotal => "chamadas_internacional_total", Integer, Calls;
    CallsTotal => "chamadas_total", Integer, Calls;

    ShortNumbers => "numeros_curtos", Integer, OtherTraffic;
    MmsTotal => "mms_total", Integer, OtherTraffic;
}

impl FieldName {
    pub fn belongs_to(self, form: FormKind) -> bool {
        self.group().form().map_or(true, |owner| owner == form)
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown questionnaire field '{0}'")]
pub struct UnknownField(pub String);

impl FromStr for FieldName {
    type Err = UnknownField;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        FieldName::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == trimmed)
            .ok_or_else(|| UnknownField(value.to_string()))
    }
}

impl Serialize for FieldName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn wire_names_are_unique() {
        let names: BTreeSet<&str> = FieldName::ALL.iter().map(|field| field.as_str()).collect();
        assert_eq!(names.len(), FieldName::ALL.len());
    }

    #[test]
    fn parses_wire_names_back_to_variants() {
        for field in FieldName::ALL {
            assert_eq!(field.as_str().parse::<FieldName>(), Ok(*field));
        }
        assert!("numero_utilizadores_outros".parse::<FieldName>().is_err());
    }

    #[test]
    fn period_fields_are_shared_between_forms() {
        assert!(FieldName::Operator.belongs_to(FormKind::MobileStations));
        assert!(FieldName::Operator.belongs_to(FormKind::OriginatedTraffic));
        assert!(!FieldName::SmsTotal.belongs_to(FormKind::MobileStations));
        assert!(FormKind::OriginatedTraffic
            .fields()
            .all(|field| field.group() != FieldGroup::MobileMoney));
    }

    #[test]
    fn service_and_session_inputs_are_owned_by_their_forms() {
        assert_eq!("sms".parse::<FieldName>(), Ok(FieldName::SmsStations));
        assert!(FieldName::MobileTvStations.belongs_to(FormKind::MobileStations));
        assert!(!FieldName::OutboundRoamingStations.belongs_to(FormKind::OriginatedTraffic));
        assert_eq!(FieldName::Internet4gUsbSessions.group(), FieldGroup::Data);
        assert!(FieldName::MmsTotal.belongs_to(FormKind::OriginatedTraffic));
        assert_eq!(FieldName::ShortNumbers.kind(), FieldKind::Integer);
    }

    #[test]
    fn form_accepts_hyphenated_identifiers() {
        assert_eq!(
            "estacoes-moveis".parse::<FormKind>(),
            Ok(FormKind::MobileStations)
        );
        assert_eq!(
            FormKind::OriginatedTraffic.draft_key(),
            "trafego_originado_draft"
        );
        assert!("assinantes".parse::<FormKind>().is_err());
    }

    #[test]
    fn serializes_with_wire_names() {
        let json = serde_json::to_string(&FieldName::Usb3gUsers).expect("serializes");
        assert_eq!(json, "\"utilizadores_3g_placas_usb\"");
        let parsed: FieldName = serde_json::from_str("\"sms_total\"").expect("deserializes");
        assert_eq!(parsed, FieldName::SmsTotal);
    }
}
