use std::sync::Arc;

use opentelemetry::global;
use opentelemetry::metrics::{Counter, Meter, UpDownCounter};
use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::Registry;

use crate::glue::PipelineCounters;
use crate::pipeline::steering::SteeringCounters;
use crate::{Nica, PipelineDirection};

fn direction_label(direction: PipelineDirection) -> &'static str {
    match direction {
        PipelineDirection::HostToNet => "host_to_net",
        PipelineDirection::NetToHost => "net_to_host",
    }
}

#[derive(Default)]
struct SampleState {
    per_direction: [(PipelineCounters, SteeringCounters); 2],
    ikernel_count: i64,
}

/// Counters every `spec.md` surface names: per-direction frame
/// accounting (§4.2 "increment the matching counter"), the steering
/// per-check histogram (§4.2), and the process-wide ikernel count
/// (§4.4). Ikernel-internal counters (`THRESHOLD_*`,
/// `STATS_GET_REQUESTS*`, …) are read back through the gateway register
/// map per engine and are exported by whichever caller owns that
/// engine's config, not polled generically here.
#[derive(Clone)]
pub struct Metrics {
    frames_in_total: Counter<u64>,
    frames_out_total: Counter<u64>,
    dropped_total: Counter<u64>,
    non_udp_passthrough_total: Counter<u64>,
    unknown_ikernel_total: Counter<u64>,
    ring_unconfigured_drops_total: Counter<u64>,

    steering_disabled_total: Counter<u64>,
    steering_not_ipv4_total: Counter<u64>,
    steering_bad_length_total: Counter<u64>,
    steering_not_udp_total: Counter<u64>,
    steering_hits_total: Counter<u64>,
    steering_misses_total: Counter<u64>,

    ikernels_active: UpDownCounter<i64>,

    last: Arc<std::sync::Mutex<SampleState>>,
}

impl Metrics {
    fn new(meter: Meter) -> Self {
        Self {
            frames_in_total: meter
                .u64_counter("nica_frames_in_total")
                .with_description("Frames entering a pipeline direction")
                .build(),
            frames_out_total: meter
                .u64_counter("nica_frames_out_total")
                .with_description("Frames emitted from a pipeline direction")
                .build(),
            dropped_total: meter
                .u64_counter("nica_dropped_total")
                .with_description("Packets dropped by a DROP flow-table action")
                .build(),
            non_udp_passthrough_total: meter
                .u64_counter("nica_non_udp_passthrough_total")
                .with_description("Non-UDP frames routed to the passthrough port untouched")
                .build(),
            unknown_ikernel_total: meter
                .u64_counter("nica_unknown_ikernel_total")
                .with_description("Steering decisions that named an ikernel id with no configured engine")
                .build(),
            ring_unconfigured_drops_total: meter
                .u64_counter("nica_ring_unconfigured_drops_total")
                .with_description("Custom-ring packets dropped for lack of a ring context")
                .build(),

            steering_disabled_total: meter
                .u64_counter("nica_steering_disabled_total")
                .with_description("Packets forced to passthrough by a disabled pipeline (spec.md \u{a7}4.2)")
                .build(),
            steering_not_ipv4_total: meter
                .u64_counter("nica_steering_not_ipv4_total")
                .with_description("Packets forced to passthrough: ethertype != 0x0800")
                .build(),
            steering_bad_length_total: meter
                .u64_counter("nica_steering_bad_length_total")
                .with_description("Packets forced to passthrough: tot_len < 28")
                .build(),
            steering_not_udp_total: meter
                .u64_counter("nica_steering_not_udp_total")
                .with_description("Packets forced to passthrough: protocol != 17")
                .build(),
            steering_hits_total: meter
                .u64_counter("nica_steering_hits_total")
                .with_description("Flow-table lookups that matched an entry")
                .build(),
            steering_misses_total: meter
                .u64_counter("nica_steering_misses_total")
                .with_description("Flow-table lookups with no matching entry")
                .build(),

            ikernels_active: meter
                .i64_up_down_counter("nica_ikernels_active")
                .with_description("Number of ikernel engines currently wired into the runtime")
                .build(),

            last: Arc::new(std::sync::Mutex::new(SampleState::default())),
        }
    }

    /// Samples both pipeline directions' counters and reports the delta
    /// since the previous call as OpenTelemetry counter increments. Cheap
    /// to call once per boundary poll-loop iteration; every counter
    /// inside `Nica` is monotonic for the life of the process
    /// (`spec.md` §5 "ikernel state persists until process exit"), so
    /// deltas never go negative.
    pub fn sample(&self, nica: &Nica) {
        let mut last = self.last.lock().unwrap();

        let ikernel_count = nica.ikernel_count() as i64;
        self.ikernels_active.add(ikernel_count - last.ikernel_count, &[]);
        last.ikernel_count = ikernel_count;

        for (idx, direction) in [PipelineDirection::HostToNet, PipelineDirection::NetToHost].into_iter().enumerate() {
            let attrs = [KeyValue::new("direction", direction_label(direction))];
            let counters = nica.counters(direction);
            let steering = nica.steering_counters(direction);
            let (prev_counters, prev_steering) = &mut last.per_direction[idx];

            self.frames_in_total.add(counters.frames_in - prev_counters.frames_in, &attrs);
            self.frames_out_total.add(counters.frames_out - prev_counters.frames_out, &attrs);
            self.dropped_total.add(counters.dropped - prev_counters.dropped, &attrs);
            self.non_udp_passthrough_total.add(counters.non_udp_passthrough - prev_counters.non_udp_passthrough, &attrs);
            self.unknown_ikernel_total.add(counters.unknown_ikernel - prev_counters.unknown_ikernel, &attrs);
            self.ring_unconfigured_drops_total
                .add(counters.ring_unconfigured_drops - prev_counters.ring_unconfigured_drops, &attrs);

            self.steering_disabled_total.add(steering.disabled - prev_steering.disabled, &attrs);
            self.steering_not_ipv4_total.add(steering.not_ipv4 - prev_steering.not_ipv4, &attrs);
            self.steering_bad_length_total.add(steering.bad_length - prev_steering.bad_length, &attrs);
            self.steering_not_udp_total.add(steering.not_udp - prev_steering.not_udp, &attrs);
            self.steering_hits_total.add(steering.hits - prev_steering.hits, &attrs);
            self.steering_misses_total.add(steering.misses - prev_steering.misses, &attrs);

            *prev_counters = PipelineCounters {
                frames_in: counters.frames_in,
                frames_out: counters.frames_out,
                dropped: counters.dropped,
                non_udp_passthrough: counters.non_udp_passthrough,
                unknown_ikernel: counters.unknown_ikernel,
                ring_unconfigured_drops: counters.ring_unconfigured_drops,
            };
            *prev_steering = *steering;
        }
    }
}

pub fn init_metrics() -> Result<(Arc<Metrics>, Registry), Box<dyn std::error::Error + Send + Sync>> {
    let registry = Registry::default();

    let exporter = opentelemetry_prometheus::exporter().with_registry(registry.clone()).build()?;

    let meter_provider = SdkMeterProvider::builder().with_reader(exporter).build();

    global::set_meter_provider(meter_provider);

    let meter = global::meter("nica");
    let metrics = Arc::new(Metrics::new(meter));

    Ok((metrics, registry))
}
