//! Integration tests for yc-output.

#[cfg(test)]
mod csv_tests {
    use tempfile::TempDir;
    use yc_core::{Axis, BoxId, EquipmentId, OperationId, RequestId};
    use yc_motion::LoadState;
    use yc_request::{Rejection, RequestKind, RequestState};
    use yc_sim::{OpKind, OpState, OperationRecord, ProbeEvent, RequestRecord, YardObserver};
    use yc_workflow::MotionRecord;

    use crate::csv::{CsvWriter, MOTION_HEADER, OPERATION_HEADER, REQUEST_HEADER};
    use crate::observer::RecordingObserver;
    use crate::row::{MotionRow, OperationRow};
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn read(dir: &TempDir, file: &str) -> (Vec<String>, Vec<csv::StringRecord>) {
        let mut rdr = csv::Reader::from_path(dir.path().join(file)).unwrap();
        let headers = rdr.headers().unwrap().iter().map(str::to_owned).collect();
        let rows = rdr.records().map(|r| r.unwrap()).collect();
        (headers, rows)
    }

    fn op_record(op: u32, request: Option<u32>) -> OperationRecord {
        OperationRecord {
            op:        OperationId(op),
            kind:      OpKind::Store,
            equipment: EquipmentId(1),
            request:   request.map(RequestId),
            box_id:    Some(BoxId(7)),
            state:     OpState::Finished,
            start:     100.0,
            finish:    160.0,
            motions:   vec![
                MotionRecord { axis: Axis::Hoist, load: LoadState::Empty, start: 0.0, duration: 8.0, from: 22.0, to: 5.9 },
                MotionRecord { axis: Axis::Gantry, load: LoadState::Loaded, start: 20.0, duration: 12.0, from: 3.2, to: 41.6 },
            ],
        }
    }

    fn request_record(failure: Option<Rejection>) -> RequestRecord {
        RequestRecord {
            request:      RequestId(3),
            kind:         RequestKind::Retrieve,
            box_id:       Some(BoxId(7)),
            equipment:    None,
            state:        if failure.is_some() { RequestState::REJECTED } else { RequestState::FINISHED },
            arrival:      10.0,
            ready:        Some(10.0),
            start:        None,
            finish:       None,
            reject_count: 1,
            failure,
        }
    }

    #[test]
    fn csv_files_created_with_headers() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        assert_eq!(read(&dir, "operations.csv").0, OPERATION_HEADER);
        assert_eq!(read(&dir, "motions.csv").0, MOTION_HEADER);
        assert_eq!(read(&dir, "requests.csv").0, REQUEST_HEADER);
    }

    #[test]
    fn missing_ids_are_empty_fields() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_operation(&OperationRow {
            op:        0,
            kind:      "MOVE",
            equipment: 0,
            request:   u32::MAX,
            box_id:    u32::MAX,
            state:     "FINISHED",
            start:     1.0,
            finish:    2.5,
        })
        .unwrap();
        w.finish().unwrap();
        let (_, rows) = read(&dir, "operations.csv");
        assert_eq!(&rows[0][3], "");
        assert_eq!(&rows[0][4], "");
        assert_eq!(&rows[0][7], "2.500");
    }

    #[test]
    fn empty_motion_batch_ok() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_motions(&[] as &[MotionRow]).unwrap();
        w.finish().unwrap();
        assert!(read(&dir, "motions.csv").1.is_empty());
    }

    #[test]
    fn finish_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }

    #[test]
    fn observer_writes_operation_and_motions() {
        let dir = tmp();
        let mut obs = RecordingObserver::new(CsvWriter::new(dir.path()).unwrap());
        obs.on_probe(160.0, &ProbeEvent::OperationFinish(op_record(4, Some(2))));
        obs.on_probe(160.0, &ProbeEvent::BoxAlloc { box_id: BoxId(7), cell: yc_core::Cell::new(0, 0, 0) });
        obs.on_run_end(200.0);
        assert!(obs.take_error().is_none());
        assert_eq!(obs.counts(), (1, 0));

        let (_, ops) = read(&dir, "operations.csv");
        assert_eq!(ops.len(), 1);
        assert_eq!(&ops[0][1], "STORE");
        assert_eq!(&ops[0][3], "2");

        let (_, motions) = read(&dir, "motions.csv");
        assert_eq!(motions.len(), 2);
        // Motion start is absolute.
        assert_eq!(&motions[1][4], "120.000");
        assert_eq!(&motions[1][2], Axis::Gantry.to_string());
    }

    #[test]
    fn observer_marks_failed_requests() {
        let dir = tmp();
        let mut obs = RecordingObserver::new(CsvWriter::new(dir.path()).unwrap());
        obs.on_probe(50.0, &ProbeEvent::RequestFinished(request_record(None)));
        let failed = request_record(Some(Rejection::Undefined("no slot for relocation".into())));
        obs.on_probe(60.0, &ProbeEvent::RequestFailed(failed));
        obs.on_run_end(60.0);
        assert!(obs.take_error().is_none());

        let (_, rows) = read(&dir, "requests.csv");
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][4], "FINISHED");
        assert_eq!(&rows[1][4], "FAILED");
        assert_eq!(&rows[1][9], "undefined");
        assert_eq!(&rows[1][6], "");
    }

    #[test]
    fn integration_csv() {
        use yc_core::{LaneId, YardConfig};
        use yc_sim::{CraneConfig, GridLayout, YardBuilder};

        let mut b = YardBuilder::new(YardConfig::default());
        let block = b.block(GridLayout::new(8, 4, 4));
        b.crane(block, CraneConfig::default());
        let mut yard = b.build().unwrap();
        let (box_id, _) = yard.store(0.0, block, LaneId(0), None).unwrap();
        yard.retrieve(500.0, box_id, LaneId(0)).unwrap();

        let dir = tmp();
        let mut obs = RecordingObserver::new(CsvWriter::new(dir.path()).unwrap());
        yard.run(&mut obs).unwrap();
        assert!(obs.take_error().is_none(), "no write errors expected");

        let (_, requests) = read(&dir, "requests.csv");
        assert_eq!(requests.len(), 2);
        let (_, ops) = read(&dir, "operations.csv");
        assert!(ops.iter().any(|r| &r[1] == "STORE"));
        assert!(ops.iter().any(|r| &r[1] == "RETRIEVE"));
        assert!(!read(&dir, "motions.csv").1.is_empty());
    }
}
