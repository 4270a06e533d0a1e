//! Named ticker lists.
//!
//! The built-in lists can be overridden or extended from a JSON file of the
//! form `{ "key": ["TICKER", ...] }`.

use analysis_core::AnalysisError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const PENNY: &str = "penny";
pub const SMALL_CAP: &str = "small-cap";
pub const BIG_TECH: &str = "big-tech";

const PENNY_TICKERS: &[&str] = &[
    "ABEV", "ABVE", "ACHR", "ADTX", "AEMD", "AFRM", "AGIO", "ALUR", "AMLI", "AMPG", "AMRN",
    "ANTE", "APDN", "APLT", "APTO", "AQST", "ASII", "ATHA", "ATUS", "BBAI", "BB", "BFLY", "BITF",
    "BNGO", "BPTH", "BTE", "BTBT", "BTG", "BURU", "CALA", "CAN", "CARA", "CBAT", "CHPT", "CLOV",
    "CMRX", "CNTX", "CRCW", "CRIS", "CRLBF", "CRSP", "CTM", "CUTR", "CUE", "CYBN", "DIDIY", "DNN",
    "DNA", "DOCU", "DVAX", "EDBL", "EOSE", "ENSC", "ESPR", "EXAS", "FCEL", "FGEN", "FLGT", "FRSX",
    "GILD", "GLGI", "GOEV", "GOSS", "GSAT", "HAO", "HIRU", "HMBL", "ICCT", "ICCM", "IQ", "IPHA",
    "INVZ", "IONS", "JDZG", "JKS", "JOB", "KPTI", "KUKE", "KULR", "LAC", "LAES", "LDTC", "LICN",
    "LITM", "LOGC", "LOOP", "LPSN", "LTRY", "LUCD", "LYFT", "MBRX", "MLGO", "MNKD", "MRMD", "MNTK",
    "MVIS", "MYNA", "NEGG", "NIO", "NKLA", "NMHI", "NNAX", "OCGN", "OGI", "ONMD", "OPEN", "OPK",
    "OPTT", "PACB", "PALT", "PED", "PHIL", "PLUG", "PRLD", "PRTA", "PSTX", "QNRX", "QSI", "RCEL",
    "RIG", "RIME", "RONN", "RVMD", "RYCEY", "SENS", "SES", "SGMO", "SIDU", "SPI", "SRMX", "SVMH",
    "TANH", "TNEYF", "TLRY", "TOVX", "TPET", "TRX", "UAMY", "URG", "VCIG", "VEEE", "VSTE", "VXRT",
    "WFSTF", "WKHS", "XELB", "XHG", "XIACF", "XTIA", "XXII", "ZNOG",
];

const SMALL_CAP_TICKERS: &[&str] = &[
    "ACLS", "AFRM", "AGEN", "AGIO", "AKRO", "ALKS", "ALVR", "AMKR", "ANIK", "APLS", "APP", "ARQT",
    "ASRT", "ATEN", "ATRA", "AXGN", "BCYC", "BEAM", "BMRN", "BLUE", "BLZE", "CALM", "CARA", "CDNA",
    "CELH", "CLDX", "CLNE", "CLOV", "CMBM", "CMTL", "CNDT", "CODX", "COUR", "CRSP", "CRVS", "CTMX",
    "CUE", "CUTR", "CYRX", "DAKT", "DAWN", "DENN", "DERM", "DGII", "DNA", "DNN", "DVAX", "EDIT",
    "ENTA", "EOLS", "EXAS", "FATE", "FGEN", "FIP", "FLGT", "FOLD", "FRSH", "GAN", "GILD", "GLTO",
    "GMAB", "GOSS", "HRTX", "IBRX", "INO", "IONS", "ITRI", "JBLU", "JKS", "KPTI", "LESL", "LGVN",
    "LIVN", "LOGC", "MCRB", "MNKD", "MNTK", "MRVI", "NTLA", "OCGN", "OPK", "OSUR", "PACB", "PRTA",
    "PTCT", "QURE", "RGEN", "RIGL", "RLMD", "RMNI", "RVMD", "SEER", "SERV", "SGMO", "SHPH", "PM",
];

const BIG_TECH_TICKERS: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "NVDA", "META", "ADBE", "ORCL", "INTC", "CRM",
    "CSCO", "QCOM", "AMD", "IBM", "SAP", "SHOP", "UBER", "SQ", "PYPL", "PLTR", "SNOW", "ASML",
    "SPOT", "ZM", "LYFT", "DOCU", "CRWD", "NET", "FSLY",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedList {
    pub key: String,
    pub label: String,
    pub tickers: Vec<String>,
}

impl NamedList {
    fn new(key: &str, label: &str, tickers: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            tickers: tickers.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickerUniverse {
    lists: Vec<NamedList>,
}

impl Default for TickerUniverse {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TickerUniverse {
    pub fn builtin() -> Self {
        Self {
            lists: vec![
                NamedList::new(PENNY, "Penny Stocks", PENNY_TICKERS),
                NamedList::new(SMALL_CAP, "Small Cap Stocks", SMALL_CAP_TICKERS),
                NamedList::new(BIG_TECH, "Big Tech Stocks", BIG_TECH_TICKERS),
            ],
        }
    }

    /// Parse `{ "key": ["TICKER", ...] }`. Keys are kept in sorted order and
    /// tickers are trimmed and uppercased.
    pub fn from_json_str(json: &str) -> Result<Self, AnalysisError> {
        let raw: BTreeMap<String, Vec<String>> = serde_json::from_str(json)
            .map_err(|e| AnalysisError::Config(format!("Invalid universe file: {}", e)))?;

        let lists = raw
            .into_iter()
            .map(|(key, tickers)| {
                let key = key.trim().to_lowercase();
                if key.is_empty() {
                    return Err(AnalysisError::Config("Universe list with an empty name".to_string()));
                }
                Ok(NamedList {
                    label: key.clone(),
                    key,
                    tickers: normalize(tickers.iter().map(String::as_str)),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { lists })
    }

    pub fn load_file(path: &Path) -> Result<Self, AnalysisError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::Config(format!("Cannot read universe file {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Lists in `other` replace same-named lists here (keeping their label and
    /// position); new names are appended.
    pub fn merge(mut self, other: TickerUniverse) -> Self {
        for incoming in other.lists {
            match self.lists.iter_mut().find(|l| l.key == incoming.key) {
                Some(existing) => existing.tickers = incoming.tickers,
                None => self.lists.push(incoming),
            }
        }
        self
    }

    pub fn resolve(&self, key: &str) -> Option<&NamedList> {
        let key = key.trim().to_lowercase();
        self.lists.iter().find(|l| l.key == key)
    }

    pub fn lists(&self) -> &[NamedList] {
        &self.lists
    }
}

/// Split a comma-separated ticker list. Items are trimmed and uppercased,
/// empty items dropped, order kept.
pub fn parse_custom_list(input: &str) -> Vec<String> {
    normalize(input.split(','))
}

fn normalize<'a>(tickers: impl Iterator<Item = &'a str>) -> Vec<String> {
    tickers
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .collect()
}
