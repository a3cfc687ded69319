/// Domain security probes (DMARC, SPF, DKIM, mail-server transport)
///
/// Each probe is an independent collaborator that turns DNS/SMTP
/// observations into a fact set. Probes never classify; classification
/// is the evaluator's job.
pub mod dkim;
pub mod dmarc;
pub mod mail_server;
pub mod spf;
pub mod types;

pub use dkim::DkimProbe;
pub use dmarc::DmarcProbe;
pub use mail_server::MailServerProbe;
pub use spf::SpfProbe;
pub use types::{
    AllQualifier, DkimFacts, DkimKeyType, DmarcFacts, DmarcPolicy, KeyLengthClass,
    MailServerFacts, ProbeFindings, SpfFacts,
};
