use crate::error::FeedError;
use crate::source::{FeedFile, Interval, MrtRecordStream, StreamSource};
use bgpkit_broker::{BgpkitBroker, BrokerItem};
use log::info;

/// Feed of the updates files archived by route collectors (RouteViews, RIPE RIS), located through
/// the BGPKIT broker.
///
/// Opening the source queries the broker once per collector and unions the results; files are
/// then read in order of their start time.
#[derive(Debug, Clone, Default)]
pub struct BrokerSource {
    broker_url: Option<String>,
}

impl BrokerSource {
    pub fn new() -> Self {
        BrokerSource::default()
    }

    /// Uses a broker instance other than the public one.
    pub fn with_broker_url(mut self, url: &str) -> Self {
        self.broker_url = Some(url.to_string());
        self
    }

    fn query(&self, interval: &Interval, collector: &str) -> Result<Vec<BrokerItem>, FeedError> {
        let ts_start = interval.start.to_string();
        let ts_end = interval.end.to_string();
        let mut broker = BgpkitBroker::new()
            .ts_start(ts_start.as_str())
            .ts_end(ts_end.as_str())
            .collector_id(collector)
            .data_type("updates");
        if let Some(url) = &self.broker_url {
            broker = broker.broker_url(url.as_str());
        }
        broker
            .query()
            .map_err(|e| FeedError::Broker(format!("{}: {}", collector, e)))
    }
}

impl StreamSource for BrokerSource {
    type Records = MrtRecordStream;

    fn open(
        &mut self,
        interval: &Interval,
        collectors: &[String],
    ) -> Result<MrtRecordStream, FeedError> {
        info!("Creating BGP stream with filters");
        let mut items = vec![];
        for collector in collectors {
            info!("Adding collector: {}", collector);
            items.extend(self.query(interval, collector.as_str())?);
        }
        info!("Time interval filter added: {}", interval);

        items.sort_by(|a, b| {
            a.ts_start
                .cmp(&b.ts_start)
                .then_with(|| a.collector_id.cmp(&b.collector_id))
        });
        info!("{} updates files to read", items.len());

        let files = items
            .into_iter()
            .map(|item| FeedFile {
                collector: item.collector_id,
                url: item.url,
            })
            .collect();
        Ok(MrtRecordStream::new(files, *interval))
    }
}
