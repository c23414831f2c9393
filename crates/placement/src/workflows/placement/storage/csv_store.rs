use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::super::domain::{
    Application, ApplicationId, Internship, InternshipId, RepresentativeId,
    RepresentativeProfile, StaffId, StaffProfile, StudentId, StudentProfile,
};
use super::super::reconciliation::ReconciliationReport;
use super::super::repository::{ChangeSet, Directory, PlacementRepository, RepositoryError};
use super::super::sequence::IdSequence;
use super::memory::InMemoryDirectory;
use super::{PlacementSnapshot, StorageError};

pub const INTERNSHIPS_FILE: &str = "internships.csv";
pub const APPLICATIONS_FILE: &str = "applications.csv";
pub const STUDENTS_FILE: &str = "students.csv";
pub const REPRESENTATIVES_FILE: &str = "representatives.csv";
pub const STAFF_FILE: &str = "staff.csv";
/// Present while staged record files are being renamed into place.
pub const COMMIT_MARKER: &str = "commit.pending";
const RECORD_FILES: [&str; 2] = [INTERNSHIPS_FILE, APPLICATIONS_FILE];

pub fn read_internships<R: Read>(reader: R) -> Result<Vec<Internship>, StorageError> {
    read_rows(reader, INTERNSHIPS_FILE)
}

pub fn read_applications<R: Read>(reader: R) -> Result<Vec<Application>, StorageError> {
    read_rows(reader, APPLICATIONS_FILE)
}

pub fn write_internships<W: Write>(
    writer: W,
    internships: &[Internship],
) -> Result<(), StorageError> {
    write_rows(writer, internships, INTERNSHIPS_FILE)
}

pub fn write_applications<W: Write>(
    writer: W,
    applications: &[Application],
) -> Result<(), StorageError> {
    write_rows(writer, applications, APPLICATIONS_FILE)
}

fn read_rows<T: DeserializeOwned, R: Read>(
    reader: R,
    file: &str,
) -> Result<Vec<T>, StorageError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.deserialize::<T>() {
        rows.push(record.map_err(|source| StorageError::Csv {
            file: file.to_string(),
            source,
        })?);
    }
    Ok(rows)
}

fn write_rows<T: Serialize, W: Write>(
    writer: W,
    rows: &[T],
    file: &str,
) -> Result<(), StorageError> {
    let csv_error = |source| StorageError::Csv {
        file: file.to_string(),
        source,
    };

    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row).map_err(csv_error)?;
    }
    csv_writer
        .flush()
        .map_err(|source| StorageError::Io {
            path: PathBuf::from(file),
            source,
        })
}

/// Read one file of the data directory; a missing file holds no rows.
fn load_file<T: DeserializeOwned>(root: &Path, file: &str) -> Result<Vec<T>, StorageError> {
    let path = root.join(file);
    match File::open(&path) {
        Ok(handle) => read_rows(BufReader::new(handle), file),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "data file absent; starting empty");
            Ok(Vec::new())
        }
        Err(source) => Err(StorageError::Io { path, source }),
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn staged_path(root: &Path, file: &str) -> PathBuf {
    root.join(format!("{file}.tmp"))
}

/// Write `rows` to a sibling temp file, returning its path for a later rename.
fn stage_file<T: Serialize>(root: &Path, file: &str, rows: &[T]) -> Result<PathBuf, StorageError> {
    let staged = staged_path(root, file);
    let handle = File::create(&staged).map_err(io_error(&staged))?;
    let mut writer = BufWriter::new(handle);
    write_rows(&mut writer, rows, file)?;
    writer.flush().map_err(io_error(&staged))?;
    writer.get_ref().sync_all().map_err(io_error(&staged))?;
    Ok(staged)
}

/// Finish or discard a commit a previous process left behind. With the
/// marker present every staged file is complete, so the renames are
/// replayed; without it the staged files never became a commit.
fn recover_interrupted_commit(root: &Path) -> Result<(), StorageError> {
    let marker = root.join(COMMIT_MARKER);
    let committed = marker.exists();

    for file in RECORD_FILES {
        let staged = staged_path(root, file);
        if !staged.exists() {
            continue;
        }
        if committed {
            let target = root.join(file);
            fs::rename(&staged, &target).map_err(io_error(&target))?;
        } else {
            fs::remove_file(&staged).map_err(io_error(&staged))?;
        }
    }

    if committed {
        fs::remove_file(&marker).map_err(io_error(&marker))?;
        warn!(root = %root.display(), "completed an interrupted commit");
    }
    Ok(())
}

/// Repository persisted as CSV files in a data directory.
///
/// Records are served from memory; every commit rewrites both record files
/// through temp files and only then publishes the new state.
#[derive(Debug)]
pub struct CsvPlacementStore {
    root: PathBuf,
    state: Mutex<PlacementSnapshot>,
    sequence: IdSequence,
}

impl CsvPlacementStore {
    /// Load `internships.csv` and `applications.csv` from `root` and
    /// reconcile seat counts before the store is handed out.
    pub fn open(root: impl Into<PathBuf>) -> Result<(Self, ReconciliationReport), StorageError> {
        let root = root.into();
        recover_interrupted_commit(&root)?;
        let internships: Vec<Internship> = load_file(&root, INTERNSHIPS_FILE)?;
        let applications: Vec<Application> = load_file(&root, APPLICATIONS_FILE)?;
        let (snapshot, report) = PlacementSnapshot::load_checked(internships, applications)?;
        let sequence = snapshot.sequence();

        info!(
            root = %root.display(),
            internships = snapshot.internships.len(),
            applications = snapshot.applications.len(),
            "loaded placement records"
        );

        let store = Self {
            root,
            state: Mutex::new(snapshot),
            sequence,
        };
        Ok((store, report))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write the current in-memory state back to disk.
    pub fn flush(&self) -> Result<(), StorageError> {
        let state = self.lock();
        self.persist(&state)
    }

    fn persist(&self, snapshot: &PlacementSnapshot) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).map_err(io_error(&self.root))?;

        let internships = stage_file(&self.root, INTERNSHIPS_FILE, &snapshot.internship_list())?;
        let applications =
            stage_file(&self.root, APPLICATIONS_FILE, &snapshot.application_list())?;

        // Once the marker exists the commit is decided; `open` replays any
        // rename that did not happen.
        let marker = self.root.join(COMMIT_MARKER);
        File::create(&marker)
            .and_then(|handle| handle.sync_all())
            .map_err(io_error(&marker))?;

        for (staged, file) in [
            (internships, INTERNSHIPS_FILE),
            (applications, APPLICATIONS_FILE),
        ] {
            let target = self.root.join(file);
            fs::rename(&staged, &target).map_err(io_error(&target))?;
        }
        fs::remove_file(&marker).map_err(io_error(&marker))
    }

    fn lock(&self) -> MutexGuard<'_, PlacementSnapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PlacementRepository for CsvPlacementStore {
    fn fetch_internship(&self, id: InternshipId) -> Result<Option<Internship>, RepositoryError> {
        Ok(self.lock().internships.get(&id).cloned())
    }

    fn fetch_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        Ok(self.lock().applications.get(&id).cloned())
    }

    fn internships(&self) -> Result<Vec<Internship>, RepositoryError> {
        Ok(self.lock().internship_list())
    }

    fn applications(&self) -> Result<Vec<Application>, RepositoryError> {
        Ok(self.lock().application_list())
    }

    fn next_internship_id(&self) -> Result<InternshipId, RepositoryError> {
        self.sequence.next_internship_id()
    }

    fn next_application_id(&self) -> Result<ApplicationId, RepositoryError> {
        self.sequence.next_application_id()
    }

    fn commit(&self, changes: ChangeSet) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        let mut staged = state.clone();
        staged.apply(changes);
        self.persist(&staged)?;
        *state = staged;
        Ok(())
    }
}

/// People directory loaded from `students.csv`, `representatives.csv` and
/// `staff.csv`. Approval changes rewrite `representatives.csv`.
#[derive(Debug)]
pub struct CsvDirectory {
    root: PathBuf,
    people: InMemoryDirectory,
    writes: Mutex<()>,
}

impl CsvDirectory {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        let students: Vec<StudentProfile> = load_file(&root, STUDENTS_FILE)?;
        let representatives: Vec<RepresentativeProfile> =
            load_file(&root, REPRESENTATIVES_FILE)?;
        let staff: Vec<StaffProfile> = load_file(&root, STAFF_FILE)?;

        let people = students
            .into_iter()
            .fold(InMemoryDirectory::new(), InMemoryDirectory::with_student);
        let people = representatives
            .into_iter()
            .fold(people, InMemoryDirectory::with_representative);
        let people = staff
            .into_iter()
            .fold(people, InMemoryDirectory::with_staff);

        let (students, representatives, staff) = people.counts();
        info!(
            root = %root.display(),
            students,
            representatives,
            staff,
            "loaded directory"
        );
        Ok(Self {
            root,
            people,
            writes: Mutex::new(()),
        })
    }

    pub fn counts(&self) -> (usize, usize, usize) {
        self.people.counts()
    }

    fn persist_representatives(&self, rows: &[RepresentativeProfile]) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).map_err(io_error(&self.root))?;
        let staged = stage_file(&self.root, REPRESENTATIVES_FILE, rows)?;
        let target = self.root.join(REPRESENTATIVES_FILE);
        fs::rename(&staged, &target).map_err(io_error(&target))
    }
}

impl Directory for CsvDirectory {
    fn student(&self, id: &StudentId) -> Result<Option<StudentProfile>, RepositoryError> {
        self.people.student(id)
    }

    fn representative(
        &self,
        id: &RepresentativeId,
    ) -> Result<Option<RepresentativeProfile>, RepositoryError> {
        self.people.representative(id)
    }

    fn representatives(&self) -> Result<Vec<RepresentativeProfile>, RepositoryError> {
        self.people.representatives()
    }

    fn save_representative(&self, profile: RepresentativeProfile) -> Result<(), RepositoryError> {
        let _writes = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        let mut rows = self.people.representatives()?;
        match rows.iter_mut().find(|row| row.id == profile.id) {
            Some(row) => *row = profile.clone(),
            None => rows.push(profile.clone()),
        }
        self.persist_representatives(&rows)?;
        self.people.save_representative(profile)
    }

    fn staff(&self, id: &StaffId) -> Result<Option<StaffProfile>, RepositoryError> {
        self.people.staff(id)
    }
}
