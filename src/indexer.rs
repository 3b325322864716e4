use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::block::{read_block_norms, BlockBuilder, BlockReader};
use crate::config::SearchConfig;
use crate::document::{collect_case_files, extract_content};
use crate::error::Error;
use crate::norms::{DocNorms, LENGTHS_FILE};
use crate::postings::{serialize_postings, write_record, DictRecord, Posting};
use crate::preprocess::{count_tokens, generate_ngrams, NgramModel, Preprocessor};

/// Documents per block. Sized so that a worker's in-memory partial index
/// stays small relative to available memory on the target corpora.
pub const BLOCK_SIZE: usize = 300;

/// Builds the complete index for a corpus directory: parallel block
/// construction into a scoped temporary area, then one streaming merge per
/// n-gram model into the dictionary and postings files. Also writes the
/// norms file (`lengths.txt`) and the configuration record into `work_dir`.
pub fn build_index(
    dir_doc: &Path,
    dict_path: &Path,
    postings_path: &Path,
    work_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let lengths_path = work_dir.join(LENGTHS_FILE);
    for path in [dict_path, postings_path, lengths_path.as_path()] {
        remove_if_exists(path)?;
    }

    let files = collect_case_files(dir_doc);
    println!(
        "Indexing {} documents from {}",
        files.len(),
        dir_doc.display()
    );

    let tmp = tempfile::tempdir()?;
    for model in NgramModel::ALL {
        fs::create_dir_all(tmp.path().join(model.dir_name()))?;
    }

    let chunks: Vec<(usize, &[(u32, PathBuf)])> = files.chunks(BLOCK_SIZE).enumerate().collect();

    let pb = ProgressBar::new(chunks.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>4}/{len:4} blocks")
            .unwrap(),
    );
    let pb = Arc::new(Mutex::new(Some(pb)));
    let pb_clone = Arc::clone(&pb);

    let results: Result<Vec<()>, Error> = chunks
        .par_iter()
        .map(|(block_index, chunk)| {
            let result = build_block(chunk, *block_index, tmp.path());
            if let Ok(pb_lock) = pb_clone.lock() {
                if let Some(ref pb) = *pb_lock {
                    pb.inc(1);
                }
            }
            result
        })
        .collect();

    if let Err(e) = results {
        // Leave the block files behind so the failure can be inspected.
        let kept = tmp.into_path();
        eprintln!(
            "Block construction failed; temporary blocks kept at {}",
            kept.display()
        );
        return Err(e.into());
    }

    if let Ok(pb_lock) = pb.lock() {
        if let Some(ref pb) = *pb_lock {
            pb.finish_with_message("blocks built");
        }
    }

    let mut dict_writer = BufWriter::new(File::create(dict_path)?);
    let mut postings_writer = BufWriter::new(File::create(postings_path)?);

    let mut model_norms = Vec::new();
    for model in NgramModel::ALL {
        let model_dir = tmp.path().join(model.dir_name());
        let merged = merge_model_blocks(&model_dir, &mut dict_writer, &mut postings_writer)?;
        println!(
            "Merged {} model: {} terms, {} documents",
            model.dir_name(),
            merged.term_count,
            merged.norms.len()
        );
        model_norms.push(merged.norms);
    }
    dict_writer.flush()?;
    postings_writer.flush()?;

    let bigram = model_norms.pop().unwrap_or_default();
    let unigram = model_norms.pop().unwrap_or_default();
    DocNorms::new(unigram, bigram).save(&lengths_path)?;

    SearchConfig {
        dir_doc: dir_doc.to_path_buf(),
        dict_path: dict_path.to_path_buf(),
        postings_path: postings_path.to_path_buf(),
        lengths_path,
    }
    .save(work_dir)?;

    println!("Index written to {}", dict_path.display());
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<(), io::Error> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// One worker's job: preprocess a chunk of documents and serialize a sorted
/// block per model. Workers share nothing; each block index maps to its own
/// files.
fn build_block(chunk: &[(u32, PathBuf)], block_index: usize, tmp: &Path) -> Result<(), Error> {
    let preprocessor = Preprocessor::new();
    let mut builders: Vec<BlockBuilder> = NgramModel::ALL.iter().map(|_| BlockBuilder::new()).collect();

    for (doc_id, path) in chunk {
        let content = match extract_content(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Skipping document {}: {}", path.display(), e);
                continue;
            }
        };
        let tokens = preprocessor.preprocess(&content);
        for model in NgramModel::ALL {
            let grams = generate_ngrams(&tokens, model.n());
            if grams.is_empty() {
                continue;
            }
            let counts = count_tokens(&grams);
            builders[model.index()].add_document(*doc_id, &counts);
        }
    }

    for model in NgramModel::ALL {
        let builder = std::mem::take(&mut builders[model.index()]);
        builder.write(&tmp.join(model.dir_name()), block_index)?;
    }
    Ok(())
}

/// A buffered head record of one block, ordered for the merge heap: term
/// first, then block id so that ties resolve toward earlier (lower doc-id)
/// blocks.
struct MergeEntry {
    term: String,
    block_id: usize,
    postings: Vec<Posting>,
}

impl PartialEq for MergeEntry {
    fn eq(&self, other: &Self) -> bool {
        self.term == other.term && self.block_id == other.block_id
    }
}

impl Eq for MergeEntry {}

impl Ord for MergeEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.term
            .cmp(&other.term)
            .then_with(|| self.block_id.cmp(&other.block_id))
    }
}

impl PartialOrd for MergeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub struct MergedModel {
    pub norms: BTreeMap<u32, f64>,
    pub term_count: usize,
}

/// Streams all block files of one model through a k-way heap merge, emitting
/// dictionary entries and postings payloads, then the model's boundary
/// sentinel. Duplicate terms across blocks coalesce into one postings list;
/// ascending doc-id order is preserved because blocks cover disjoint
/// ascending document ranges. Returns the model's folded norms.
pub fn merge_model_blocks<W1: Write, W2: Write>(
    model_dir: &Path,
    dict_writer: &mut W1,
    postings_writer: &mut W2,
) -> Result<MergedModel, Error> {
    let mut post_paths = Vec::new();
    let mut norm_paths = Vec::new();
    for entry in fs::read_dir(model_dir)? {
        let path = entry?.path();
        match path.extension().and_then(|e| e.to_str()) {
            Some("post") => post_paths.push(path),
            Some("norms") => norm_paths.push(path),
            _ => {}
        }
    }
    post_paths.sort();
    norm_paths.sort();

    let mut readers = Vec::with_capacity(post_paths.len());
    let mut heap = BinaryHeap::new();
    for (block_id, path) in post_paths.iter().enumerate() {
        let mut reader = BlockReader::open(path, block_id)?;
        // Empty blocks contribute nothing and drop out here.
        if let Some((term, postings)) = reader.next_record()? {
            heap.push(std::cmp::Reverse(MergeEntry {
                term,
                block_id,
                postings,
            }));
        }
        readers.push(reader);
    }

    let mut target: Option<(String, Vec<Posting>)> = None;
    let mut term_count = 0usize;

    while let Some(std::cmp::Reverse(entry)) = heap.pop() {
        if let Some((term, postings)) = readers[entry.block_id].next_record()? {
            heap.push(std::cmp::Reverse(MergeEntry {
                term,
                block_id: entry.block_id,
                postings,
            }));
        }

        match &mut target {
            Some((term, list)) if *term == entry.term => list.extend(entry.postings),
            _ => {
                if let Some((term, list)) = target.take() {
                    flush_term(dict_writer, postings_writer, term, &list)?;
                    term_count += 1;
                }
                target = Some((entry.term, entry.postings));
            }
        }
    }

    if let Some((term, list)) = target.take() {
        flush_term(dict_writer, postings_writer, term, &list)?;
        term_count += 1;
    }
    write_record(dict_writer, &DictRecord::Boundary)?;

    let mut norms = BTreeMap::new();
    for path in &norm_paths {
        norms.extend(read_block_norms(path)?);
    }

    Ok(MergedModel { norms, term_count })
}

fn flush_term<W1: Write, W2: Write>(
    dict_writer: &mut W1,
    postings_writer: &mut W2,
    term: String,
    postings: &[Posting],
) -> Result<(), Error> {
    let payload = serialize_postings(postings)?;
    write_record(
        dict_writer,
        &DictRecord::Entry {
            term,
            len: payload.len() as u64,
        },
    )?;
    postings_writer.write_all(&payload)?;
    Ok(())
}
